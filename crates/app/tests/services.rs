mod support;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use support::{at, car_stay, setup_app};
use tariff_app::{AppError, CheckIn};
use tariff_core::{
    Adjustment, LineKind, PricingRuleInput, RuleConditions, RuleType, ThresholdInput,
    TimeWindowInput, WindowType,
};

fn cap_rule(value: Decimal) -> PricingRuleInput {
    PricingRuleInput {
        rule_type: RuleType::DailyMax,
        conditions: RuleConditions::default(),
        adjustment: Adjustment::Cap { value },
        priority: 0,
        active: true,
        description: Some("cap".to_string()),
    }
}

#[test]
fn quote_prices_hourly_stay_with_first_hour_override() {
    let app = setup_app();
    let result = app
        .state
        .services
        .fees
        .quote(1, &car_stay(at(3, 9, 0), at(3, 11, 30)))
        .expect("quote");
    assert_eq!(result.amount, dec!(26));
    assert_eq!(result.elapsed_minutes, 150);
    let listed: Decimal = result.breakdown.iter().map(|line| line.amount).sum();
    assert_eq!(listed, result.amount);
}

#[test]
fn quote_waives_courtesy_stays() {
    let app = setup_app();
    let result = app
        .state
        .services
        .fees
        .quote(1, &car_stay(at(3, 9, 0), at(3, 9, 10)))
        .expect("quote");
    assert_eq!(result.amount, Decimal::ZERO);
    assert!(result.courtesy_applied);
    assert_eq!(result.breakdown[0].kind, LineKind::Courtesy);
}

#[test]
fn quote_rejects_unknown_rate_and_reversed_stay() {
    let app = setup_app();
    let fees = &app.state.services.fees;
    assert!(matches!(
        fees.quote(99, &car_stay(at(3, 9, 0), at(3, 10, 0))),
        Err(AppError::NotFound(_))
    ));
    assert!(matches!(
        fees.quote(1, &car_stay(at(3, 10, 0), at(3, 9, 0))),
        Err(AppError::Fee(_))
    ));
}

#[test]
fn quote_rejects_inactive_rate() {
    let app = setup_app();
    let plan = app.state.services.rates.plan(6).expect("plan");
    let input = tariff_core::RateInput {
        name: plan.rate.name.clone(),
        vehicle_category: plan.rate.vehicle_category.clone(),
        rate_type: plan.rate.rate_type,
        unit_price: plan.rate.unit_price,
        unit: plan.rate.unit,
        courtesy_minutes: plan.rate.courtesy_minutes,
        active: false,
        config: plan.rate.config.clone(),
    };
    app.state
        .services
        .rates
        .upsert(Some(6), &input)
        .expect("deactivate");
    assert!(matches!(
        app.state
            .services
            .fees
            .quote(6, &car_stay(at(3, 9, 0), at(3, 10, 0))),
        Err(AppError::InvalidInput(_))
    ));
}

#[test]
fn preview_compares_candidate_rules_without_saving() {
    let app = setup_app();
    let samples = vec![car_stay(at(3, 8, 0), at(3, 18, 0))];
    let preview = app
        .state
        .services
        .fees
        .preview(1, &[cap_rule(dec!(20))], &samples)
        .expect("preview");
    assert_eq!(preview.len(), 1);
    assert_eq!(preview[0].candidate.amount, dec!(20));
    assert!(preview[0].current.amount > dec!(20));
    assert!(preview[0].candidate.applied_rule_ids.iter().all(|id| *id < 0));

    let stored = app.state.services.rates.plan(1).expect("plan");
    assert_eq!(stored.rules.len(), 2);
}

#[test]
fn replacing_rules_updates_later_quotes() {
    let app = setup_app();
    let rates = &app.state.services.rates;
    let stored = rates
        .replace_rules(1, &[cap_rule(dec!(20))])
        .expect("replace rules");
    assert_eq!(stored.len(), 1);
    let result = app
        .state
        .services
        .fees
        .quote(1, &car_stay(at(3, 8, 0), at(3, 18, 0)))
        .expect("quote");
    assert_eq!(result.amount, dec!(20));
    assert_eq!(result.applied_rule_ids, vec![stored[0].id]);
}

#[test]
fn threshold_validation_rejects_bad_targets() {
    let app = setup_app();
    let rates = &app.state.services.rates;
    let own = ThresholdInput {
        target_rate_id: 1,
        amount: dec!(10),
        auto_apply: false,
    };
    assert!(matches!(
        rates.replace_thresholds(1, &[own]),
        Err(AppError::InvalidInput(_))
    ));
    let missing = ThresholdInput {
        target_rate_id: 42,
        amount: dec!(10),
        auto_apply: false,
    };
    assert!(matches!(
        rates.replace_thresholds(1, &[missing]),
        Err(AppError::NotFound(_))
    ));
}

#[test]
fn window_validation_rejects_unknown_extra_rate() {
    let app = setup_app();
    let window = TimeWindowInput {
        window_type: WindowType::Overnight,
        start_time: chrono::NaiveTime::from_hms_opt(20, 0, 0),
        end_time: chrono::NaiveTime::from_hms_opt(8, 0, 0),
        start_day: None,
        end_day: None,
        duration_limit_minutes: None,
        extra_rate_id: Some(77),
        active: true,
        metadata: Default::default(),
    };
    assert!(matches!(
        app.state.services.rates.replace_windows(3, &[window]),
        Err(AppError::NotFound(_))
    ));
}

#[test]
fn check_out_prices_and_closes_ticket() {
    let app = setup_app();
    let tickets = &app.state.services.tickets;
    let ticket = tickets
        .check_in(CheckIn {
            plate: "abc-1234".to_string(),
            rate_id: 1,
            vehicle_category: None,
            entry_at: Some(at(3, 9, 0)),
        })
        .expect("check in");
    assert_eq!(ticket.plate, "ABC1234");
    assert_eq!(ticket.vehicle_category, "car");
    assert_eq!(tickets.list_open().expect("open").len(), 1);

    let duplicate = tickets.check_in(CheckIn {
        plate: "ABC 1234".to_string(),
        rate_id: 1,
        ..CheckIn::default()
    });
    assert!(matches!(duplicate, Err(AppError::InvalidInput(_))));

    let closed = tickets
        .check_out(ticket.id, Some(at(3, 11, 30)))
        .expect("check out");
    assert_eq!(closed.total_value, Some(dec!(26)));
    assert_eq!(closed.fee.as_ref().map(|fee| fee.amount), Some(dec!(26)));
    assert!(tickets.list_open().expect("open").is_empty());

    assert!(matches!(
        tickets.check_out(ticket.id, Some(at(3, 12, 0))),
        Err(AppError::InvalidInput(_))
    ));
}

#[test]
fn settings_update_normalizes_and_validates() {
    let app = setup_app();
    let settings = &app.state.services.settings;
    let current = settings.get().expect("settings");
    assert_eq!(current.currency, "BRL");
    assert_eq!(current.minor_units, 2);

    settings.update(Some("usd"), Some(0)).expect("update");
    let updated = settings.get().expect("settings");
    assert_eq!(updated.currency, "USD");
    assert_eq!(updated.minor_units, 0);

    assert!(matches!(
        settings.update(None, Some(9)),
        Err(AppError::InvalidInput(_))
    ));
}

#[test]
fn minor_units_setting_controls_rounding() {
    let app = setup_app();
    app.state
        .services
        .rates
        .replace_rules(
            6,
            &[PricingRuleInput {
                rule_type: RuleType::TimeRange,
                conditions: RuleConditions {
                    hour_start: Some(8),
                    hour_end: Some(12),
                    days_of_week: Vec::new(),
                },
                adjustment: Adjustment::Multiplier { value: dec!(1.111) },
                priority: 0,
                active: true,
                description: None,
            }],
        )
        .expect("replace rules");
    let stay = tariff_core::StayInterval {
        entry: at(3, 9, 0),
        exit: at(3, 10, 0),
        vehicle_category: "motorcycle".to_string(),
    };

    let cents = app.state.services.fees.quote(6, &stay).expect("quote");
    assert_eq!(cents.amount, dec!(4.44));

    app.state
        .services
        .settings
        .update(None, Some(0))
        .expect("update");
    let whole = app.state.services.fees.quote(6, &stay).expect("quote");
    assert_eq!(whole.amount, dec!(4));
}
