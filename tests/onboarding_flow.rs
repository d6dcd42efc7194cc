use wello_core::questionnaire::{
    record::BiologicalSex, FlowEvent, FlowSequencer, HomeView, OnboardingSession, Params,
    StepAction, StepKind, StepSettings, TerminalStrategy,
};

fn session() -> OnboardingSession {
    OnboardingSession::new(FlowSequencer::default())
}

fn advance(session: &mut OnboardingSession, home: &mut HomeView) -> FlowEvent {
    session.next(home).unwrap()
}

#[test]
fn full_questionnaire_reaches_home() {
    let mut home = HomeView::new();
    let mut session = session();

    session.apply(StepAction::Toggle("Vegan".into())).unwrap();
    assert_eq!(
        advance(&mut session, &mut home),
        FlowEvent::Advanced(StepKind::WeightHeight)
    );

    session.apply(StepAction::ToggleWeightUnit).unwrap();
    session.apply(StepAction::SetWeight("150".into())).unwrap();
    session.apply(StepAction::ToggleWeightUnit).unwrap();
    assert!(session
        .current()
        .summary()
        .contains(&("weight".to_string(), "68 kg".to_string())));
    advance(&mut session, &mut home);

    session.apply(StepAction::SetAge(42)).unwrap();
    advance(&mut session, &mut home);

    session.apply(StepAction::Select("Female".into())).unwrap();
    advance(&mut session, &mut home);

    session.apply(StepAction::Select("2".into())).unwrap();
    advance(&mut session, &mut home);

    session.apply(StepAction::Toggle("Anemia".into())).unwrap();
    session.apply(StepAction::Toggle("ibs".into())).unwrap();
    session.apply(StepAction::Toggle("Anemia".into())).unwrap();
    let forwarded = session.snapshot();
    assert_eq!(forwarded.get("dietaryRestrictions"), Some(r#"["Vegan"]"#));
    assert_eq!(forwarded.get("weight"), Some("68.0"));
    assert_eq!(forwarded.get("height"), Some(""));
    assert_eq!(forwarded.get("age"), Some("42"));
    assert_eq!(forwarded.get("biologicalSex"), Some("Female"));
    assert_eq!(forwarded.get("physicalActivity"), Some("30-60 mins daily"));
    assert_eq!(forwarded.get("healthConditions"), Some(r#"["IBS"]"#));

    assert_eq!(
        advance(&mut session, &mut home),
        FlowEvent::Advanced(StepKind::Completion)
    );
    let FlowEvent::Submitted(submission) = advance(&mut session, &mut home) else {
        panic!("completion step should submit");
    };

    let record = &submission.record;
    assert_eq!(record.dietary_restrictions, vec!["Vegan".to_string()]);
    assert_eq!(record.weight, Some(68.0));
    assert_eq!(record.height, None);
    assert_eq!(record.age, Some(42));
    assert_eq!(record.biological_sex, Some(BiologicalSex::Female));
    assert_eq!(record.health_conditions, vec!["IBS".to_string()]);
    assert_eq!(home.received(), 1);
    assert_eq!(home.latest().map(|s| s.id), Some(submission.id));
}

#[test]
fn forwarded_mapping_only_grows() {
    let mut home = HomeView::new();
    let mut session = session();
    let mut seen = 0;

    while session.current_kind() != StepKind::BiologicalSex {
        let forwarded = session.snapshot();
        assert!(forwarded.len() >= seen);
        for key in session.current_frame().received().keys() {
            assert!(forwarded.contains(key), "dropped upstream key {key}");
        }
        seen = forwarded.len();
        advance(&mut session, &mut home);
    }
    assert_eq!(seen, 4);
}

#[test]
fn back_then_forward_keeps_earlier_answers() {
    let mut home = HomeView::new();
    let mut session = session();
    session.apply(StepAction::Toggle("Kosher".into())).unwrap();
    advance(&mut session, &mut home);
    let first_received = session.current_frame().received().clone();
    session.apply(StepAction::SetHeight("170".into())).unwrap();
    advance(&mut session, &mut home);

    assert_eq!(session.back(), FlowEvent::Returned(StepKind::WeightHeight));
    assert_eq!(session.back(), FlowEvent::Returned(StepKind::DietaryRestrictions));
    assert_eq!(
        session.snapshot().get("dietaryRestrictions"),
        Some(r#"["Kosher"]"#)
    );

    advance(&mut session, &mut home);
    assert_eq!(session.snapshot().get("height"), Some(""));
    assert_eq!(session.current_frame().received(), &first_received);
}

#[test]
fn toggling_twice_restores_selection() {
    let mut session = session();
    let before = session.snapshot();
    session.apply(StepAction::Toggle("Halal".into())).unwrap();
    assert_ne!(session.snapshot(), before);
    session.apply(StepAction::Toggle("halal".into())).unwrap();
    assert_eq!(session.snapshot(), before);
}

#[test]
fn unknown_labels_are_rejected_with_suggestion() {
    let mut session = session();
    let err = session
        .apply(StepAction::Toggle("Vegann".into()))
        .unwrap_err()
        .to_string();
    assert!(err.contains("Vegann"), "{err}");
    assert_eq!(session.snapshot().get("dietaryRestrictions"), Some("[]"));
}

#[test]
fn single_choice_steps_gate_next() {
    let mut home = HomeView::new();
    let mut session =
        OnboardingSession::enter_at(FlowSequencer::default(), StepKind::PhysicalActivity, Params::new())
            .unwrap();
    assert!(!session.can_advance());
    assert_eq!(
        advance(&mut session, &mut home),
        FlowEvent::Blocked(StepKind::PhysicalActivity)
    );
    session.apply(StepAction::Select("<30 mins daily".into())).unwrap();
    assert!(session.can_advance());
}

#[test]
fn malformed_list_field_falls_back_to_empty() {
    let mut params = Params::new();
    params.insert("dietaryRestrictions", "Vegan,Halal");
    params.insert("healthConditions", "not json");
    let session =
        OnboardingSession::enter_at(FlowSequencer::default(), StepKind::HealthConditions, params)
            .unwrap();
    assert_eq!(session.snapshot().get("healthConditions"), Some("[]"));
}

#[test]
fn health_conditions_can_be_terminal() {
    let mut home = HomeView::new();
    let sequencer = FlowSequencer::new(TerminalStrategy::HealthConditions, StepSettings::default());
    let mut session = OnboardingSession::enter_at(sequencer, StepKind::HealthConditions, Params::new())
        .unwrap();
    assert!(session.is_terminal());
    assert!(matches!(
        advance(&mut session, &mut home),
        FlowEvent::Submitted(_)
    ));
    assert_eq!(home.received(), 1);
}
