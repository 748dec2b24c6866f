use serde::Serialize;

#[derive(Serialize)]
pub struct SettingsResponse {
    pub currency: String,
    pub minor_units: u32,
    pub db_path: String,
    pub tariff_defaults_path: String,
    pub app_data_dir: String,
}

#[derive(Serialize)]
pub struct DeletedResponse {
    pub deleted: i64,
}

#[derive(Serialize)]
pub struct OkResponse {
    pub ok: bool,
}
