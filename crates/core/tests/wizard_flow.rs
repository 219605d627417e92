use std::sync::Arc;

use quickquote_core::{
    Catalog, DomainError, DraftField, FlowTransitionError, InMemorySubmissionSink, QuoteWizard,
    Scope, ViolationKind, WizardStep,
};
use rust_decimal::Decimal;

fn wizard() -> QuoteWizard {
    QuoteWizard::new(Arc::new(Catalog::reference()))
}

fn scope(value: u8) -> Scope {
    Scope::new(value).expect("valid scope")
}

fn fill_contact(wizard: &mut QuoteWizard) {
    wizard.set_name("Margaret Hamilton").expect("name");
    wizard.set_email("margaret@apollo.example").expect("email");
    wizard.set_company("Apollo Guidance").expect("company");
}

#[test]
fn cloud_quote_walks_through_infra_and_submits_26000() {
    let mut wizard = wizard();
    let sink = InMemorySubmissionSink::default();

    wizard.select_service("cloud").expect("service");
    assert_eq!(wizard.estimated_price(), Some(Decimal::from(10_000)));
    assert_eq!(wizard.next().expect("to technologies").to, WizardStep::TechnologySelect);

    wizard.toggle_technology("aws").expect("aws");
    wizard.toggle_technology("terraform").expect("terraform");
    assert_eq!(wizard.next().expect("to scope").to, WizardStep::ScopeSelect);

    wizard.set_scope(scope(3)).expect("scope");
    assert_eq!(wizard.next().expect("to infra").to, WizardStep::InfraSelect);

    wizard.select_infra("mid").expect("infra");
    assert_eq!(wizard.estimated_price(), Some(Decimal::from(26_000)));
    assert_eq!(wizard.next().expect("to contact").to, WizardStep::ContactCapture);
    assert!(wizard.contact_revealed());
    assert_eq!(wizard.progress(), (5, 5));

    fill_contact(&mut wizard);
    let submission = wizard.submit(&sink).expect("valid submission");

    assert_eq!(wizard.current_step(), WizardStep::Submitted);
    assert_eq!(submission.estimated_price, Decimal::from(26_000));
    assert_eq!(submission.draft.infra.as_ref().map(|id| id.as_str()), Some("mid"));
    assert_eq!(sink.submissions(), vec![submission]);
}

#[test]
fn database_quote_skips_infra_and_prices_at_base() {
    let mut wizard = wizard();
    let sink = InMemorySubmissionSink::default();

    wizard.select_service("db").expect("service");
    wizard.next().expect("to technologies");
    wizard.next().expect("to scope");
    wizard.set_scope(scope(1)).expect("scope");
    assert_eq!(wizard.next().expect("to contact").to, WizardStep::ContactCapture);
    assert_eq!(wizard.progress(), (4, 4));

    fill_contact(&mut wizard);
    let submission = wizard.submit(&sink).expect("valid submission");
    assert_eq!(submission.estimated_price, Decimal::from(4_000));
    assert!(submission.draft.technologies.is_empty());
}

#[test]
fn fullstack_long_engagement_prices_at_140000() {
    let mut wizard = wizard();
    wizard.select_service("fullstack").expect("service");
    wizard.toggle_technology("ios").expect("ios");
    wizard.toggle_technology("react").expect("react");
    wizard.set_scope(scope(6)).expect("scope");

    assert_eq!(wizard.estimated_price(), Some(Decimal::from(140_000)));
}

#[test]
fn next_is_a_no_op_until_a_service_is_chosen() {
    let mut wizard = wizard();
    let error = wizard.next().expect_err("service required");

    assert!(matches!(
        error,
        DomainError::FlowTransition(FlowTransitionError::Blocked {
            step: WizardStep::ServiceSelect,
            ..
        })
    ));
    assert_eq!(wizard.current_step(), WizardStep::ServiceSelect);
    assert_eq!(wizard.estimated_price(), None);
}

#[test]
fn branch_is_reevaluated_after_changing_service() {
    let mut wizard = wizard();
    wizard.select_service("db").expect("service");
    wizard.next().expect("to technologies");
    wizard.next().expect("to scope");
    wizard.next().expect("to contact");

    wizard.back().expect("to scope");
    wizard.back().expect("to technologies");
    wizard.back().expect("to service");
    wizard.select_service("iac").expect("switch to iac");

    wizard.next().expect("to technologies");
    wizard.next().expect("to scope");
    assert_eq!(wizard.next().expect("branch").to, WizardStep::InfraSelect);
}

#[test]
fn infra_step_blocks_until_a_tier_is_selected() {
    let mut wizard = wizard();
    wizard.select_service("cloud").expect("service");
    wizard.next().expect("to technologies");
    wizard.next().expect("to scope");
    wizard.next().expect("to infra");

    let error = wizard.next().expect_err("tier required");
    assert_eq!(error.field_violations()[0].field, DraftField::Infra);
    assert_eq!(error.field_violations()[0].kind, ViolationKind::MissingSelection);
    assert_eq!(wizard.current_step(), WizardStep::InfraSelect);

    assert_eq!(wizard.back().expect("back to scope").to, WizardStep::ScopeSelect);
}

#[test]
fn back_then_forward_leaves_the_draft_unchanged() {
    let mut wizard = wizard();
    wizard.select_service("cloud").expect("service");
    wizard.toggle_technology("gcp").expect("gcp");
    wizard.next().expect("to technologies");
    wizard.next().expect("to scope");
    wizard.set_scope(scope(5)).expect("scope");
    wizard.next().expect("to infra");
    wizard.select_infra("enterprise").expect("infra");
    wizard.next().expect("to contact");
    wizard.set_name("Linus").expect("name");

    let snapshot = wizard.state().clone();
    for _ in 0..4 {
        wizard.back().expect("walk back");
    }
    assert_eq!(wizard.current_step(), WizardStep::ServiceSelect);
    for _ in 0..4 {
        wizard.next().expect("walk forward");
    }

    assert_eq!(wizard.state(), &snapshot);
}

#[test]
fn invalid_contact_details_block_submission_without_emitting() {
    let mut wizard = wizard();
    let sink = InMemorySubmissionSink::default();
    wizard.select_service("consulting").expect("service");
    wizard.next().expect("to technologies");
    wizard.next().expect("to scope");
    wizard.next().expect("to contact");

    wizard.set_name("Barbara").expect("name");
    wizard.set_email("barbara at example dot com").expect("email");
    let error = wizard.submit(&sink).expect_err("invalid contact");

    let violations = error.field_violations();
    assert_eq!(violations.len(), 2);
    assert!(violations
        .iter()
        .any(|v| v.field == DraftField::Email && v.kind == ViolationKind::InvalidFormat));
    assert!(violations
        .iter()
        .any(|v| v.field == DraftField::Company && v.kind == ViolationKind::EmptyRequired));
    assert_eq!(wizard.current_step(), WizardStep::ContactCapture);
    assert!(sink.submissions().is_empty());

    wizard.set_email("barbara@example.com").expect("email");
    wizard.set_company("Liskov Labs").expect("company");
    wizard.submit(&sink).expect("valid submission");
    assert_eq!(sink.submissions().len(), 1);
}

#[test]
fn submit_is_rejected_before_the_contact_stage() {
    let mut wizard = wizard();
    let sink = InMemorySubmissionSink::default();
    wizard.select_service("db").expect("service");
    fill_contact(&mut wizard);

    let error = wizard.submit(&sink).expect_err("not at contact stage");
    assert!(matches!(
        error,
        DomainError::FlowTransition(FlowTransitionError::InvalidTransition { .. })
    ));
    assert!(sink.submissions().is_empty());
}

#[test]
fn stale_infra_is_kept_in_the_draft_but_not_priced_or_submitted() {
    let mut wizard = wizard();
    let sink = InMemorySubmissionSink::default();
    wizard.select_service("cloud").expect("service");
    wizard.select_infra("enterprise").expect("infra");
    assert_eq!(wizard.estimated_price(), Some(Decimal::from(22_000)));

    wizard.select_service("db").expect("switch to db");
    assert_eq!(wizard.estimated_price(), Some(Decimal::from(8_000)));
    assert!(wizard.draft().infra.is_some());

    wizard.next().expect("to technologies");
    wizard.next().expect("to scope");
    assert_eq!(wizard.next().expect("skip infra").to, WizardStep::ContactCapture);
    fill_contact(&mut wizard);

    let submission = wizard.submit(&sink).expect("valid submission");
    assert!(submission.draft.infra.is_none());
    assert_eq!(submission.estimated_price, Decimal::from(8_000));
}

#[test]
fn submission_trims_contact_fields() {
    let mut wizard = wizard();
    let sink = InMemorySubmissionSink::default();
    wizard.select_service("mobile").expect("service");
    wizard.next().expect("to technologies");
    wizard.next().expect("to scope");
    wizard.next().expect("to contact");
    wizard.set_name("  Katherine Johnson ").expect("name");
    wizard.set_email(" kj@nasa.example ").expect("email");
    wizard.set_company(" NASA ").expect("company");

    let submission = wizard.submit(&sink).expect("valid submission");
    assert_eq!(submission.draft.name, "Katherine Johnson");
    assert_eq!(submission.draft.email, "kj@nasa.example");
    assert_eq!(submission.draft.company, "NASA");
}

#[test]
fn replacement_catalog_drives_branching_without_code_changes() {
    let catalog = Catalog::from_toml_str(
        r#"
scope_labels = ["xs", "s", "m", "l", "xl", "xxl"]

[[services]]
id = "edge"
label = "Edge Platform"
base_price = 9000
requires_infra = true

[[infra_tiers]]
id = "pop"
label = "Single PoP"
add_price = 800
"#,
    )
    .expect("catalog");
    let mut wizard = QuoteWizard::new(Arc::new(catalog));

    wizard.select_service("edge").expect("service");
    wizard.next().expect("to technologies");
    wizard.next().expect("to scope");
    assert_eq!(wizard.next().expect("branch").to, WizardStep::InfraSelect);
    wizard.select_infra("pop").expect("infra");

    // 9000 * 2 + 800 = 18800 -> 19000
    assert_eq!(wizard.estimated_price(), Some(Decimal::from(19_000)));
}
