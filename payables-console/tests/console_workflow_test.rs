mod common;

use common::{
    console_over, console_with_plan, date, money, three_installment_plan, FakeCollaborator,
    Scripted, SUPPLIER_NAME,
};
use payables_console::console::{
    BannerKind, DetailBuffer, InFlightKey, Outcome, PayablesConsole, WorkflowError,
    DEFAULT_PAYMENT_METHOD, EARLY_SETTLE_NOTES,
};
use payables_console::models::{
    CreatePlanForm, EditForm, GroupId, InstallmentStatus, SettleForm,
};
use payables_console::services::{CollaboratorFailure, ResponseBody};
use payables_console::utils::error_message::GENERIC_FAILURE_MESSAGE;
use std::sync::Arc;
use std::time::Duration;

fn settle_on(day: chrono::NaiveDate) -> SettleForm {
    SettleForm {
        payment_date: Some(day),
        payment_method: Some("PIX".to_string()),
        notes: None,
    }
}

async fn only_group(console: &PayablesConsole) -> GroupId {
    let plans = console.plans().await;
    assert_eq!(plans.len(), 1);
    let group_id = plans.plans().next().unwrap().group_id.clone();
    group_id
}

#[tokio::test]
async fn creating_a_plan_yields_three_sequential_installments() {
    let fake = FakeCollaborator::new();
    let console = console_with_plan(&fake).await;

    let summary = console.summary().await;
    assert_eq!(summary.len(), 3);

    let group = &summary[0].group_id;
    let mut sequences: Vec<u32> = summary
        .iter()
        .inspect(|row| {
            assert_eq!(&row.group_id, group);
            assert_eq!(row.status, InstallmentStatus::ToPay);
            assert_eq!(row.total_count, 3);
        })
        .map(|row| row.sequence)
        .collect();
    sequences.sort();
    assert_eq!(sequences, vec![1, 2, 3]);

    let plans = console.plans().await;
    let plan = plans.get(group).expect("plan should be grouped");
    assert_eq!(plan.total_amount, money("300.00"));
    assert_eq!((plan.paid_count, plan.total_count), (0, 3));
    assert_eq!(plan.representative().map(|r| r.sequence), Some(1));

    let banner = console.banner().await.expect("success banner");
    assert_eq!(banner.kind, BannerKind::Success);
    assert_eq!(
        banner.message,
        "Parcelamento criado com sucesso! 3 parcelas geradas."
    );

    let view = console.view().await;
    assert_eq!(view.plans[0].supplier, SUPPLIER_NAME);
    assert_eq!(view.plans[0].progress_label, "0/3");
}

#[tokio::test]
async fn invalid_plan_is_rejected_locally() {
    let fake = FakeCollaborator::new();
    let console = console_over(&fake);

    let form = CreatePlanForm {
        total_amount: Some(money("0")),
        installment_count: 0,
        first_due_date: None,
        ..three_installment_plan()
    };

    let err = console.create_plan(&form).await.unwrap_err();
    match err {
        WorkflowError::Validation(errors) => {
            let fields = errors.field_errors();
            assert!(fields.contains_key("total_amount"));
            assert!(fields.contains_key("installment_count"));
            assert!(fields.contains_key("first_due_date"));
        }
        other => panic!("expected validation error, got {:?}", other),
    }
    assert!(fake.calls().is_empty());
}

#[tokio::test]
async fn settling_the_first_installment_advances_progress() {
    let fake = FakeCollaborator::new();
    let console = console_with_plan(&fake).await;
    let group = only_group(&console).await;

    console
        .settle(1, &settle_on(date(2025, 1, 9)))
        .await
        .expect("settle should succeed");

    let summary = console.summary().await;
    let first = summary.iter().find(|r| r.id == 1).unwrap();
    assert_eq!(first.status, InstallmentStatus::Paid);
    assert_eq!(first.payment_date, Some(date(2025, 1, 9)));
    for id in [2, 3] {
        let row = summary.iter().find(|r| r.id == id).unwrap();
        assert_eq!(row.status, InstallmentStatus::ToPay);
        assert_eq!(row.payment_date, None);
    }

    let plans = console.plans().await;
    let plan = plans.get(&group).unwrap();
    assert_eq!((plan.paid_count, plan.total_count), (1, 3));
    assert!((plan.progress() - 1.0 / 3.0).abs() < f64::EPSILON);
    assert_eq!(
        console.banner().await.map(|b| b.message),
        Some("Conta baixada com sucesso!".to_string())
    );
}

#[tokio::test]
async fn mutation_reloads_expanded_group_detail() {
    let fake = FakeCollaborator::new();
    let console = console_with_plan(&fake).await;
    let group = only_group(&console).await;

    console.expand(&group).await.expect("expand should load");
    console
        .settle(2, &settle_on(date(2025, 2, 8)))
        .await
        .expect("settle should succeed");

    match console.detail(&group).await {
        Some(DetailBuffer::Ready(members)) => {
            assert_eq!(members.iter().map(|m| m.sequence).collect::<Vec<_>>(), vec![1, 2, 3]);
            assert_eq!(members[1].status, InstallmentStatus::Paid);
        }
        other => panic!("expected ready detail, got {:?}", other),
    }

    let group_loads = fake
        .calls()
        .iter()
        .filter(|c| c.starts_with("group:"))
        .count();
    assert_eq!(group_loads, 2);
}

#[tokio::test]
async fn cancel_with_reason_then_second_cancel_is_refused_locally() {
    let fake = FakeCollaborator::new();
    let console = console_with_plan(&fake).await;

    let answers = Scripted::new(true, Some("duplicate"));
    let outcome = console.cancel(2, &answers).await.expect("cancel should succeed");
    assert_eq!(outcome, Outcome::Completed);
    assert_eq!(answers.asked().len(), 2);

    let row = fake.row(2).unwrap();
    assert_eq!(row.status, InstallmentStatus::Canceled);
    assert_eq!(row.notes.as_deref(), Some("duplicate"));

    let view = console.view().await;
    let representative = view.plans[0].representative.as_ref().unwrap();
    assert_eq!(representative.id, 1);
    assert!(representative.actions.cancel);

    let cancels_before = fake.mutation_calls().len();
    let err = console
        .cancel(2, &Scripted::new(true, Some("again")))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        WorkflowError::Refused {
            id: 2,
            status: InstallmentStatus::Canceled,
            ..
        }
    ));
    assert_eq!(fake.mutation_calls().len(), cancels_before);
}

#[tokio::test]
async fn forced_cancel_rejection_surfaces_normalized_message() {
    let fake = FakeCollaborator::new();
    let console = console_with_plan(&fake).await;

    // Someone else canceled it; the console still shows it open.
    fake.force_status(3, InstallmentStatus::Canceled);

    let err = console
        .cancel(3, &Scripted::new(true, Some("duplicate")))
        .await
        .unwrap_err();
    assert!(matches!(err, WorkflowError::Collaborator(_)));
    assert_eq!(err.display_message(), "Conta já está cancelada");

    let banner = console.banner().await.unwrap();
    assert_eq!(banner.kind, BannerKind::Error);
    assert_eq!(banner.message, "Conta já está cancelada");

    // Authoritative state was re-read after the failure.
    let refreshed = console.summary().await;
    assert_eq!(
        refreshed.iter().find(|r| r.id == 3).unwrap().status,
        InstallmentStatus::Canceled
    );
}

#[tokio::test]
async fn paid_installment_refuses_settle_cancel_and_delete_without_requests() {
    let fake = FakeCollaborator::new();
    let console = console_with_plan(&fake).await;
    console
        .settle(1, &settle_on(date(2025, 1, 9)))
        .await
        .unwrap();
    let before = fake.mutation_calls();

    let settle = console.settle(1, &settle_on(date(2025, 1, 10))).await;
    let cancel = console.cancel(1, &Scripted::new(true, Some("x"))).await;
    let delete = console.delete(1, &Scripted::yes()).await;
    let early = console.early_settle(1, &Scripted::yes()).await;

    assert!(matches!(settle, Err(WorkflowError::Refused { .. })));
    assert!(matches!(cancel, Err(WorkflowError::Refused { .. })));
    assert!(matches!(delete, Err(WorkflowError::Refused { .. })));
    assert!(matches!(early, Err(WorkflowError::Refused { .. })));
    assert_eq!(fake.mutation_calls(), before);
}

#[tokio::test]
async fn declining_confirmation_sends_nothing() {
    let fake = FakeCollaborator::new();
    let console = console_with_plan(&fake).await;
    let before = fake.mutation_calls();

    assert_eq!(console.delete(1, &Scripted::no()).await.unwrap(), Outcome::Declined);
    assert_eq!(console.early_settle(1, &Scripted::no()).await.unwrap(), Outcome::Declined);
    assert_eq!(console.cancel(1, &Scripted::no()).await.unwrap(), Outcome::Declined);

    // Confirmed, but the reason prompt was dismissed or left empty.
    assert_eq!(
        console.cancel(1, &Scripted::new(true, None)).await.unwrap(),
        Outcome::Declined
    );
    assert_eq!(
        console.cancel(1, &Scripted::new(true, Some(""))).await.unwrap(),
        Outcome::Declined
    );

    assert_eq!(fake.mutation_calls(), before);
}

#[tokio::test]
async fn blank_cancel_reason_is_a_validation_error() {
    let fake = FakeCollaborator::new();
    let console = console_with_plan(&fake).await;

    let err = console
        .cancel(1, &Scripted::new(true, Some("   ")))
        .await
        .unwrap_err();
    assert!(matches!(err, WorkflowError::Validation(_)));
    assert_eq!(err.display_message(), "Informe o motivo do cancelamento");
    assert_eq!(fake.row(1).unwrap().status, InstallmentStatus::ToPay);
}

#[tokio::test]
async fn early_settle_uses_today_and_falls_back_to_cash() {
    let fake = FakeCollaborator::new();
    let console = console_with_plan(&fake)
        .await
        .with_clock(|| date(2025, 1, 5));

    let answers = Scripted::yes();
    assert_eq!(
        console.early_settle(1, &answers).await.unwrap(),
        Outcome::Completed
    );
    assert_eq!(answers.asked(), vec!["Deseja dar baixa antecipada nesta parcela?"]);

    // No method recorded on this one.
    fake.set_payment_method(2, None);
    console.load_summary().await.unwrap();
    console.early_settle(2, &Scripted::yes()).await.unwrap();

    let requests = fake.settle_requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].0, 1);
    assert_eq!(requests[0].1.datpag, date(2025, 1, 5));
    assert_eq!(requests[0].1.forpag.as_deref(), Some("PIX"));
    assert_eq!(requests[0].1.obscap.as_deref(), Some(EARLY_SETTLE_NOTES));
    assert_eq!(requests[1].1.forpag.as_deref(), Some(DEFAULT_PAYMENT_METHOD));
    assert_eq!(fake.row(2).unwrap().status, InstallmentStatus::Paid);
}

#[tokio::test]
async fn early_settle_defaults_to_the_utc_date() {
    let fake = FakeCollaborator::new();
    let console = console_with_plan(&fake).await;

    let before = chrono::Utc::now().date_naive();
    console.early_settle(1, &Scripted::yes()).await.unwrap();
    let after = chrono::Utc::now().date_naive();

    let paid_on = fake.settle_requests()[0].1.datpag;
    assert!(paid_on == before || paid_on == after);
}

#[tokio::test]
async fn overdue_installment_settles_but_is_not_early_settled() {
    let fake = FakeCollaborator::new();
    let console = console_with_plan(&fake).await;
    fake.force_status(1, InstallmentStatus::Overdue);
    console.load_summary().await.unwrap();

    assert!(matches!(
        console.early_settle(1, &Scripted::yes()).await,
        Err(WorkflowError::Refused { .. })
    ));
    console
        .settle(1, &settle_on(date(2025, 1, 20)))
        .await
        .expect("overdue installments can be settled");
    assert_eq!(fake.row(1).unwrap().status, InstallmentStatus::Paid);
}

#[tokio::test]
async fn edit_rules_depend_on_status() {
    let fake = FakeCollaborator::new();
    let console = console_with_plan(&fake).await;

    let empty = console.edit(1, &EditForm::default()).await.unwrap_err();
    assert!(matches!(empty, WorkflowError::Validation(_)));

    let payment_date_on_open = EditForm {
        payment_date: Some(date(2025, 1, 9)),
        ..Default::default()
    };
    assert!(matches!(
        console.edit(1, &payment_date_on_open).await,
        Err(WorkflowError::Refused { .. })
    ));
    assert!(fake.mutation_calls().iter().all(|c| !c.starts_with("update")));

    let new_amount = EditForm {
        amount: Some(money("120.00")),
        due_date: Some(date(2025, 1, 15)),
        ..Default::default()
    };
    console.edit(1, &new_amount).await.expect("edit should succeed");
    let row = fake.row(1).unwrap();
    assert_eq!(row.amount, money("120.00"));
    assert_eq!(row.due_date, date(2025, 1, 15));
    assert_eq!(fake.row(2).unwrap().amount, money("100.00"));

    console.settle(1, &settle_on(date(2025, 1, 9))).await.unwrap();
    assert!(matches!(
        console.edit(1, &new_amount).await,
        Err(WorkflowError::Refused { .. })
    ));
    console
        .edit(
            1,
            &EditForm {
                payment_date: Some(date(2025, 1, 8)),
                ..Default::default()
            },
        )
        .await
        .expect("payment date of a paid installment is editable");
    assert_eq!(fake.row(1).unwrap().payment_date, Some(date(2025, 1, 8)));
}

#[tokio::test]
async fn delete_removes_row_and_updates_plan() {
    let fake = FakeCollaborator::new();
    let console = console_with_plan(&fake).await;
    let group = only_group(&console).await;

    assert_eq!(
        console.delete(3, &Scripted::yes()).await.unwrap(),
        Outcome::Completed
    );
    assert!(fake.row(3).is_none());

    let plans = console.plans().await;
    assert_eq!(plans.get(&group).unwrap().total_count, 2);
    assert_eq!(plans.get(&group).unwrap().total_amount, money("200.00"));
}

#[tokio::test]
async fn second_request_for_same_installment_is_busy() {
    let fake = FakeCollaborator::new();
    let console = Arc::new(console_with_plan(&fake).await);

    let gate = fake.hold_mutations().await;
    let first = {
        let console = console.clone();
        tokio::spawn(async move { console.settle(1, &settle_on(date(2025, 1, 9))).await })
    };

    while fake.pending_mutations() == 0 {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    let second = console.settle(1, &settle_on(date(2025, 1, 9))).await;
    assert!(matches!(
        second,
        Err(WorkflowError::Busy(InFlightKey::Installment(1)))
    ));
    let view = console.view().await;
    let row = view.plans[0].representative.as_ref().unwrap();
    assert!(row.busy);
    assert!(!row.actions.settle);

    // A different installment is not blocked.
    let other = {
        let console = console.clone();
        tokio::spawn(async move { console.edit(2, &EditForm { amount: Some("90".parse().unwrap()), ..Default::default() }).await })
    };

    drop(gate);
    first.await.unwrap().expect("first settle completes");
    other.await.unwrap().expect("edit on another installment completes");
    assert_eq!(
        fake.mutation_calls()
            .iter()
            .filter(|c| c.as_str() == "settle:1")
            .count(),
        1
    );
}

#[tokio::test]
async fn plan_creation_is_single_flight() {
    let fake = FakeCollaborator::new();
    let console = Arc::new(console_over(&fake));

    let gate = fake.hold_mutations().await;
    let first = {
        let console = console.clone();
        tokio::spawn(async move { console.create_plan(&three_installment_plan()).await })
    };
    while fake.pending_mutations() == 0 {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    assert!(console.view().await.creating_plan);
    assert!(matches!(
        console.create_plan(&three_installment_plan()).await,
        Err(WorkflowError::Busy(InFlightKey::PlanCreation))
    ));

    drop(gate);
    first.await.unwrap().unwrap();
    assert_eq!(console.summary().await.len(), 3);
}

#[tokio::test]
async fn transport_failure_shows_generic_message_and_keeps_state() {
    let fake = FakeCollaborator::new();
    let console = console_with_plan(&fake).await;

    fake.fail_next_mutation(CollaboratorFailure::Transport("timed out".to_string()));
    let err = console
        .settle(1, &settle_on(date(2025, 1, 9)))
        .await
        .unwrap_err();

    assert_eq!(err.display_message(), GENERIC_FAILURE_MESSAGE);
    assert_eq!(console.banner().await.unwrap().message, GENERIC_FAILURE_MESSAGE);
    assert_eq!(
        console.summary().await.iter().find(|r| r.id == 1).unwrap().status,
        InstallmentStatus::ToPay
    );
}

#[tokio::test]
async fn validation_list_from_collaborator_is_joined() {
    let fake = FakeCollaborator::new();
    let console = console_with_plan(&fake).await;

    fake.fail_next_mutation(CollaboratorFailure::rejected(
        422,
        Some(ResponseBody::Json(serde_json::json!({
            "detail": [
                { "loc": ["body", "datpag"], "msg": "data inválida", "type": "value_error" },
                { "loc": ["body", "forpag"], "msg": "forma inválida", "type": "value_error" }
            ]
        }))),
    ));

    let err = console
        .settle(1, &settle_on(date(2025, 1, 9)))
        .await
        .unwrap_err();
    assert_eq!(err.display_message(), "data inválida; forma inválida");
}

#[tokio::test]
async fn summary_failure_keeps_previous_rows() {
    let fake = FakeCollaborator::new();
    let console = console_with_plan(&fake).await;

    fake.fail_reads(true);
    assert!(console.load_summary().await.is_err());
    assert_eq!(console.summary().await.len(), 3);
    assert_eq!(console.banner().await.unwrap().kind, BannerKind::Error);

    console.dismiss_banner().await;
    assert!(console.banner().await.is_none());
}

#[tokio::test]
async fn status_filter_narrows_summary_and_moves_representative() {
    let fake = FakeCollaborator::new();
    let console = console_with_plan(&fake).await;
    console.settle(1, &settle_on(date(2025, 1, 9))).await.unwrap();

    console
        .set_status_filter(Some(InstallmentStatus::ToPay))
        .await
        .unwrap();
    assert_eq!(console.status_filter().await, Some(InstallmentStatus::ToPay));
    assert!(fake.calls().contains(&"list:A_PAGAR".to_string()));

    let plans = console.plans().await;
    let plan = plans.plans().next().unwrap();
    assert_eq!(plan.total_count, 2);
    assert_eq!(plan.paid_count, 0);
    assert_eq!(plan.representative().map(|r| r.sequence), Some(2));

    console.set_status_filter(None).await.unwrap();
    assert_eq!(console.summary().await.len(), 3);
}

#[tokio::test]
async fn toggling_a_group_refetches_on_every_expand() {
    let fake = FakeCollaborator::new();
    let console = console_with_plan(&fake).await;
    let group = only_group(&console).await;

    assert!(console.toggle_group(&group).await.unwrap());
    assert!(matches!(console.detail(&group).await, Some(DetailBuffer::Ready(_))));

    assert!(!console.toggle_group(&group).await.unwrap());
    assert!(console.detail(&group).await.is_none());

    assert!(console.toggle_group(&group).await.unwrap());
    let loads = fake
        .calls()
        .iter()
        .filter(|c| c.starts_with("group:"))
        .count();
    assert_eq!(loads, 2);
}

#[tokio::test]
async fn failed_detail_load_is_kept_per_group() {
    let fake = FakeCollaborator::new();
    let console = console_with_plan(&fake).await;
    console.create_plan(&three_installment_plan()).await.unwrap();

    let groups: Vec<GroupId> = console
        .plans()
        .await
        .plans()
        .map(|p| p.group_id.clone())
        .collect();
    assert_eq!(groups.len(), 2);

    console.expand(&groups[0]).await.unwrap();
    fake.fail_reads(true);
    assert!(console.expand(&groups[1]).await.is_err());

    assert!(matches!(console.detail(&groups[0]).await, Some(DetailBuffer::Ready(_))));
    assert_eq!(
        console.detail(&groups[1]).await,
        Some(DetailBuffer::Failed(GENERIC_FAILURE_MESSAGE.to_string()))
    );
}

#[tokio::test]
async fn refresh_updates_expanded_detail_before_actions_are_checked() {
    let fake = FakeCollaborator::new();
    let console = console_with_plan(&fake).await;
    let group = only_group(&console).await;
    console.expand(&group).await.unwrap();

    // Another operator settles #1.
    fake.force_status(1, InstallmentStatus::Paid);
    console.load_summary().await.unwrap();

    match console.detail(&group).await {
        Some(DetailBuffer::Ready(members)) => {
            assert_eq!(members[0].status, InstallmentStatus::Paid);
        }
        other => panic!("expected ready detail, got {:?}", other),
    }

    assert!(matches!(
        console.settle(1, &settle_on(date(2025, 1, 9))).await,
        Err(WorkflowError::Refused { .. })
    ));
    assert!(matches!(
        console.delete(1, &Scripted::yes()).await,
        Err(WorkflowError::Refused { .. })
    ));
    assert_eq!(fake.mutation_calls(), vec!["create_plan".to_string()]);
}

#[tokio::test]
async fn lookup_prefers_summary_over_older_detail() {
    let fake = FakeCollaborator::new();
    let console = console_with_plan(&fake).await;
    let group = only_group(&console).await;
    console.expand(&group).await.unwrap();

    // Creating a second plan reloads the summary but not the first group.
    fake.force_status(2, InstallmentStatus::Canceled);
    console.create_plan(&three_installment_plan()).await.unwrap();

    match console.detail(&group).await {
        Some(DetailBuffer::Ready(members)) => {
            assert_eq!(members[1].status, InstallmentStatus::ToPay);
        }
        other => panic!("expected ready detail, got {:?}", other),
    }

    assert!(matches!(
        console.cancel(2, &Scripted::new(true, Some("duplicate"))).await,
        Err(WorkflowError::Refused { .. })
    ));
    assert!(!fake.mutation_calls().iter().any(|c| c.starts_with("cancel")));
}

#[tokio::test]
async fn row_without_plan_is_its_own_plan_and_never_fetched_as_a_group() {
    let fake = FakeCollaborator::new();
    let console = console_with_plan(&fake).await;
    let id = fake.add_standalone("80.00", date(2025, 3, 10));
    console.load_summary().await.unwrap();

    let plans = console.plans().await;
    assert_eq!(plans.len(), 2);
    let standalone = GroupId::standalone(id);
    let plan = plans.get(&standalone).expect("standalone plan");
    assert_eq!((plan.paid_count, plan.total_count), (0, 1));
    assert_eq!(plan.total_amount, money("80.00"));

    assert!(console.toggle_group(&standalone).await.unwrap());
    match console.detail(&standalone).await {
        Some(DetailBuffer::Ready(members)) => {
            assert_eq!(members.iter().map(|m| m.id).collect::<Vec<_>>(), vec![id]);
        }
        other => panic!("expected ready detail, got {:?}", other),
    }

    console.settle(id, &settle_on(date(2025, 3, 9))).await.unwrap();
    match console.detail(&standalone).await {
        Some(DetailBuffer::Ready(members)) => {
            assert_eq!(members[0].status, InstallmentStatus::Paid);
        }
        other => panic!("expected ready detail, got {:?}", other),
    }
    assert!(!fake.calls().iter().any(|c| c.starts_with("group:")));
}

#[tokio::test]
async fn unknown_installment_is_reported() {
    let fake = FakeCollaborator::new();
    let console = console_over(&fake);

    assert!(matches!(
        console.settle(99, &settle_on(date(2025, 1, 9))).await,
        Err(WorkflowError::UnknownInstallment(99))
    ));
    assert!(fake.calls().is_empty());
}

#[tokio::test]
async fn supplier_refresh_keeps_only_active_and_survives_failure() {
    let fake = FakeCollaborator::new();
    let console = console_over(&fake);

    console.refresh_suppliers().await;
    let suppliers = console.suppliers().await;
    assert_eq!(suppliers.len(), 1);
    assert_eq!(suppliers[0].name, SUPPLIER_NAME);

    fake.fail_reads(true);
    console.refresh_suppliers().await;
    assert_eq!(console.suppliers().await.len(), 1);
    assert!(console.banner().await.is_none());
}
