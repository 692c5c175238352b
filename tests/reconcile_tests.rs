mod common;

use chicken_road_admin::dates::QuickRange;
use chicken_road_admin::domains::{Agents, Bets, Domain, Players};
use chicken_road_admin::dto::*;
use chicken_road_admin::error::ValidationError;
use chicken_road_admin::filters::FilterSet;
use chicken_road_admin::reconcile::{ExternalSeed, FilterReconciler};
use chicken_road_admin::store::{DomainStore, FetchStatus};
use common::*;
use pretty_assertions::assert_eq;
use std::sync::Arc;

fn setup<D: Domain>() -> (Arc<ScriptedSource<D>>, Arc<DomainStore<D>>)
where
    D::Totals: Default,
{
    let source = ScriptedSource::<D>::new();
    let store = Arc::new(DomainStore::new(source.clone()));
    (source, store)
}

#[tokio::test]
async fn test_reversed_dates_are_rejected_without_fetching() {
    let (source, store) = setup::<Bets>();
    let mut view = FilterReconciler::new(store.clone(), clock());
    view.commit().await.unwrap();
    let applied_before = view.applied().clone();
    let calls_before = source.list_calls().len();

    view.set_draft_field("fromDate", "2024-03-10").unwrap();
    view.set_draft_field("toDate", "2024-03-01").unwrap();
    let err = view.commit().await.unwrap_err();

    assert!(matches!(err, ValidationError::DateOrder { .. }));
    assert_eq!(view.applied(), &applied_before);
    assert_eq!(source.list_calls().len(), calls_before);
    assert_eq!(store.applied_filters(), Some(applied_before));
    // the operator's edit stays in the draft for correction
    assert!(view.is_dirty());
}

#[tokio::test]
async fn test_quick_range_commits_immediately() {
    let (source, store) = setup::<Bets>();
    let mut view = FilterReconciler::new(store.clone(), clock());
    view.change_page(4).await.unwrap();

    let status = view.apply_quick_range(QuickRange::ThisMonth).await.unwrap();

    assert_eq!(status, FetchStatus::Applied);
    let params = source.last_list_call();
    assert_eq!(params.get("fromDate"), Some("2024-02-29T18:30:00.000Z"));
    assert_eq!(params.get("toDate"), Some("2024-03-31T18:29:59.999Z"));
    assert_eq!(params.get("page"), Some("1"));
    assert_eq!(view.draft(), view.applied());
    assert_eq!(view.active_quick_range(), Some(QuickRange::ThisMonth));
    assert_eq!(store.applied_filters().as_ref(), Some(view.applied()));
}

#[tokio::test]
async fn test_default_view_ranges() {
    let (_, bets_store) = setup::<Bets>();
    let (_, players_store) = setup::<Players>();

    let bets = FilterReconciler::new(bets_store, clock());
    let players = FilterReconciler::new(players_store, clock());

    assert_eq!(bets.active_quick_range(), Some(QuickRange::ThisWeek));
    assert_eq!(players.active_quick_range(), Some(QuickRange::LastTwoMonths));
    assert!(!bets.is_dirty());
}

#[tokio::test]
async fn test_seed_applies_over_defaults_on_first_visit() {
    let (source, store) = setup::<Players>();
    let mut view = FilterReconciler::new(store, clock());

    let seed = ExternalSeed::from_query("agentId=agent007&fromDate=2024-03-01&toDate=2024-03-05");
    view.seed_from_external(seed).await.unwrap();

    let params = source.last_list_call();
    assert_eq!(params.get("agentId"), Some("agent007"));
    assert_eq!(params.get("fromDate"), Some("2024-02-29T18:30:00.000Z"));
    assert_eq!(params.get("toDate"), Some("2024-03-05T18:29:59.999Z"));
    assert_eq!(view.draft(), view.applied());
}

#[tokio::test]
async fn test_seed_keeps_dates_already_in_store() {
    let (source, store) = setup::<Players>();

    // first visit: operator picks last month
    let mut first = FilterReconciler::new(store.clone(), clock());
    first.apply_quick_range(QuickRange::LastMonth).await.unwrap();
    let stored_dates = *first.applied().date_range();

    // navigating back via a deep link with different dates
    let mut second = FilterReconciler::new(store.clone(), clock());
    let seed = ExternalSeed::new()
        .with("agentId", "agent42")
        .with("fromDate", "2023-01-01")
        .with("toDate", "2023-01-31");
    second.seed_from_external(seed).await.unwrap();

    assert_eq!(second.applied().date_range(), &stored_dates);
    assert_eq!(second.applied().agent_id.as_deref(), Some("agent42"));
    assert_eq!(second.active_quick_range(), Some(QuickRange::LastMonth));
    assert_eq!(source.last_list_call().get("agentId"), Some("agent42"));
}

#[tokio::test]
async fn test_invalid_seed_values_are_ignored() {
    let (source, store) = setup::<Bets>();
    let mut view = FilterReconciler::new(store, clock());

    let seed = ExternalSeed::new()
        .with("status", "MAYBE")
        .with("difficulty", "hard")
        .with("colour", "red")
        .with("fromDate", "2024-03-20")
        .with("toDate", "2024-03-02");
    view.seed_from_external(seed).await.unwrap();

    let params = source.last_list_call();
    assert!(!params.contains_key("status"));
    assert!(!params.contains_key("colour"));
    assert_eq!(params.get("difficulty"), Some("HARD"));
    // reversed seed dates fall back to the default week
    assert_eq!(view.active_quick_range(), Some(QuickRange::ThisWeek));
}

#[tokio::test]
async fn test_limit_change_resets_page() {
    let (source, store) = setup::<Agents>();
    let mut view = FilterReconciler::new(store, clock());
    view.commit().await.unwrap();

    view.change_page(3).await.unwrap();
    assert_eq!(source.last_list_call().get("page"), Some("3"));

    view.change_limit(50).await.unwrap();
    let params = source.last_list_call();
    assert_eq!(params.get("page"), Some("1"));
    assert_eq!(params.get("limit"), Some("50"));
    assert_eq!(view.applied().page.page, 1);
    assert_eq!(view.applied().page.limit, 50);
    assert_eq!(view.draft().page.limit, 50);

    // a later commit keeps the chosen page size
    view.set_draft_field("game", "ChickenRoad").unwrap();
    view.commit().await.unwrap();
    assert_eq!(source.last_list_call().get("limit"), Some("50"));
}

#[tokio::test]
async fn test_change_page_past_the_last_page() {
    let (source, store) = setup::<Bets>();
    source.list_ok(page_of(bets(20), 1, 20, 45));
    source.list_ok(page_of(Vec::new(), 7, 20, 45));
    source.list_ok(page_of(bets(5), 3, 20, 45));
    let mut view = FilterReconciler::new(store.clone(), clock());
    view.commit().await.unwrap();

    let status = view.change_page(7).await.unwrap();

    assert_eq!(status, FetchStatus::Applied);
    let calls = source.list_calls();
    assert_eq!(calls.len(), 3);
    assert_eq!(calls[1].get("page"), Some("7"));
    assert_eq!(calls[2].get("page"), Some("3"));

    let state = store.snapshot();
    assert_eq!(state.rows.len(), 5);
    assert_eq!(state.pagination.page, 3);
    assert_eq!(state.applied_filters.as_ref(), Some(view.applied()));
    assert_eq!(view.applied().page.page, 3);
    assert_eq!(view.draft().page.page, 3);
    assert!(!view.is_dirty());
}

#[tokio::test]
async fn test_non_positive_pagination_is_rejected() {
    let (source, store) = setup::<Agents>();
    let mut view = FilterReconciler::new(store, clock());

    assert!(matches!(
        view.change_page(0).await,
        Err(ValidationError::NotPositive { field: "page", .. })
    ));
    assert!(matches!(
        view.change_limit(0).await,
        Err(ValidationError::NotPositive { field: "limit", .. })
    ));
    assert!(view.set_draft_field("limit", "-1").is_err());
    assert!(source.list_calls().is_empty());
}

#[tokio::test]
async fn test_draft_edits_stay_local_until_commit() {
    let (source, store) = setup::<Bets>();
    source.list_ok(page_of(bets(20), 1, 20, 100));
    source.list_ok(page_of(bets(20), 2, 20, 100));
    let mut view = FilterReconciler::new(store, clock());
    view.commit().await.unwrap();
    view.change_page(2).await.unwrap();
    let calls = source.list_calls().len();

    view.set_draft_field("status", "won").unwrap();
    assert!(view.is_dirty());
    assert_eq!(view.draft().status, Some(BetStatus::Won));
    assert_eq!(view.draft().page.page, 1);
    assert_eq!(view.applied().page.page, 2);
    assert_eq!(source.list_calls().len(), calls);

    assert!(view.set_draft_field("status", "MAYBE").is_err());
    assert_eq!(view.draft().status, Some(BetStatus::Won));
    assert!(matches!(
        view.set_draft_field("colour", "red"),
        Err(ValidationError::UnknownField(_))
    ));

    view.commit().await.unwrap();
    assert!(!view.is_dirty());
    assert_eq!(source.last_list_call().get("status"), Some("WON"));
}

#[tokio::test]
async fn test_blank_text_clears_the_field() {
    let (source, store) = setup::<Bets>();
    let mut view = FilterReconciler::new(store, clock());

    view.set_draft_field("agentId", "agent007").unwrap();
    view.set_draft_field("agentId", "   ").unwrap();
    view.set_draft_field("platform", "SPADE").unwrap();
    view.commit().await.unwrap();

    let params = source.last_list_call();
    assert!(!params.contains_key("agentId"));
    assert_eq!(params.get("platform"), Some("SPADE"));
}

#[tokio::test]
async fn test_agent_scope_is_pinned() {
    let (source, store) = setup::<Bets>();
    let mut view = FilterReconciler::new(store, clock()).with_agent_scope(Some("agent007".into()));

    assert!(matches!(
        view.set_draft_field("agentId", "agent999"),
        Err(ValidationError::Form(_))
    ));
    view.set_draft_field("agentId", "agent007").unwrap();

    view.seed_from_external(ExternalSeed::new().with("agentId", "agent999"))
        .await
        .unwrap();
    assert_eq!(source.last_list_call().get("agentId"), Some("agent007"));

    view.reset_to_default(false).await.unwrap();
    assert_eq!(source.last_list_call().get("agentId"), Some("agent007"));
}

#[tokio::test]
async fn test_reset_to_default_with_and_without_seed() {
    let (source, store) = setup::<Players>();
    let mut view = FilterReconciler::new(store, clock());
    view.seed_from_external(ExternalSeed::new().with("agentId", "agent007"))
        .await
        .unwrap();

    view.set_draft_field("game", "ChickenRoad").unwrap();
    view.apply_quick_range(QuickRange::Today).await.unwrap();

    view.reset_to_default(true).await.unwrap();
    let params = source.last_list_call();
    assert_eq!(params.get("agentId"), Some("agent007"));
    assert!(!params.contains_key("game"));
    assert_eq!(view.active_quick_range(), Some(QuickRange::LastTwoMonths));

    view.reset_to_default(false).await.unwrap();
    assert!(!source.last_list_call().contains_key("agentId"));
}

#[tokio::test]
async fn test_retry_uses_applied_filters() {
    let (source, store) = setup::<Bets>();
    source.list_err(transport_error());
    let mut view = FilterReconciler::new(store.clone(), clock());

    view.set_draft_field("currency", "INR").unwrap();
    assert_eq!(view.commit().await.unwrap(), FetchStatus::Failed);
    assert!(store.snapshot().error.is_some());

    assert_eq!(view.retry().await.unwrap(), FetchStatus::Applied);
    assert!(store.snapshot().error.is_none());
    assert_eq!(source.last_list_call().get("currency"), Some("INR"));
}

#[tokio::test]
async fn test_default_limit_is_configurable() {
    let (source, store) = setup::<Bets>();
    let mut view = FilterReconciler::new(store, clock()).with_default_limit(50);

    view.commit().await.unwrap();
    assert_eq!(source.last_list_call().get("limit"), Some("50"));
}
