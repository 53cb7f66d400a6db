//! Ticket and history API tests.

mod common;

use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use serde_json::{json, Value};

use common::{TestConfig, TestFixture, TEST_USER};

struct People {
    requester: String,
    agent: String,
    other_agent: String,
}

async fn people(fixture: &TestFixture) -> People {
    People {
        requester: fixture
            .create_collaborator("123456785", "requester@example.com")
            .await,
        agent: fixture.create_collaborator("70125382", "agent@example.com").await,
        other_agent: fixture
            .create_collaborator("111111111", "other@example.com")
            .await,
    }
}

async fn create_ticket(fixture: &TestFixture, people: &People) -> String {
    let response = fixture
        .post(
            "/api/v1/tickets",
            json!({
                "subject": "Laptop does not boot",
                "description": "Black screen after the logo",
                "requester_id": people.requester,
                "assignee_id": people.agent
            }),
        )
        .await;
    assert_status!(response, StatusCode::CREATED);
    response.body["id"].as_str().unwrap().to_string()
}

fn timestamp(value: &Value) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(value.as_str().unwrap())
        .unwrap()
        .with_timezone(&Utc)
}

fn query_timestamp(value: &Value) -> String {
    value.as_str().unwrap().replace('+', "%2B")
}

#[tokio::test]
async fn test_create_ticket_uses_default_references() {
    let fixture = TestFixture::new().await;
    let people = people(&fixture).await;
    let id = create_ticket(&fixture, &people).await;

    let response = fixture.get(&format!("/api/v1/tickets/{}", id)).await;
    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["stage"], "open");
    assert_eq!(response.body["assignee_id"], people.agent.as_str());
    assert!(response.body.get("difficulty_id").is_none());

    let history = fixture.get(&format!("/api/v1/tickets/{}/history", id)).await;
    assert_status!(history, StatusCode::OK);
    assert_eq!(history.body["entries"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_create_ticket_with_unknown_assignee() {
    let fixture = TestFixture::new().await;
    let people = people(&fixture).await;

    let response = fixture
        .post(
            "/api/v1/tickets",
            json!({
                "subject": "Printer jam",
                "description": "Tray 2",
                "requester_id": people.requester,
                "assignee_id": "nobody"
            }),
        )
        .await;
    assert_status!(response, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_stage_transitions_are_recorded_in_order() {
    let fixture = TestFixture::new().await;
    let people = people(&fixture).await;
    let id = create_ticket(&fixture, &people).await;
    let in_progress = fixture.reference_id("stage", "in_progress");
    let closed = fixture.reference_id("stage", "closed");

    for stage_id in [in_progress, closed] {
        let response = fixture
            .patch(
                &format!("/api/v1/tickets/{}", id),
                json!({ "stage_id": stage_id }),
            )
            .await;
        assert_status!(response, StatusCode::OK);
        assert_eq!(response.body["changes"].as_array().unwrap().len(), 1);
    }

    let history = fixture.get(&format!("/api/v1/tickets/{}/history", id)).await;
    let entries = history.body["entries"].as_array().unwrap();
    assert_eq!(entries.len(), 2);

    assert_eq!(entries[0]["field"], "stage");
    assert_eq!(entries[0]["old_label"], "open");
    assert_eq!(entries[0]["new_label"], "in_progress");
    assert_eq!(entries[1]["old_label"], "in_progress");
    assert_eq!(entries[1]["new_label"], "closed");
    assert_eq!(entries[1]["new_value"], closed.to_string());
    assert!(timestamp(&entries[0]["changed_at"]) < timestamp(&entries[1]["changed_at"]));
}

#[tokio::test]
async fn test_rapid_updates_have_strictly_increasing_timestamps() {
    let fixture = TestFixture::new().await;
    let people = people(&fixture).await;
    let id = create_ticket(&fixture, &people).await;

    for i in 0..10 {
        let assignee = if i % 2 == 0 {
            &people.other_agent
        } else {
            &people.agent
        };
        let response = fixture
            .patch(
                &format!("/api/v1/tickets/{}", id),
                json!({ "assignee_id": assignee }),
            )
            .await;
        assert_status!(response, StatusCode::OK);
    }

    let history = fixture.get(&format!("/api/v1/tickets/{}/history", id)).await;
    let entries = history.body["entries"].as_array().unwrap();
    assert_eq!(entries.len(), 10);

    let stamps: Vec<_> = entries.iter().map(|e| timestamp(&e["changed_at"])).collect();
    assert!(stamps.windows(2).all(|pair| pair[0] < pair[1]));
    assert_eq!(entries[9]["new_value"], people.agent.as_str());
}

#[tokio::test]
async fn test_multi_field_update_writes_one_entry_per_field() {
    let fixture = TestFixture::new().await;
    let people = people(&fixture).await;
    let id = create_ticket(&fixture, &people).await;
    let in_review = fixture.reference_id("stage", "in_review");
    let standard = fixture.reference_id("difficulty", "standard");

    let response = fixture
        .patch(
            &format!("/api/v1/tickets/{}", id),
            json!({
                "subject": "Laptop does not boot at all",
                "assignee_id": people.other_agent,
                "stage_id": in_review,
                "difficulty_id": standard
            }),
        )
        .await;
    assert_status!(response, StatusCode::OK);

    let fields: Vec<&str> = response.body["changes"]
        .as_array()
        .unwrap()
        .iter()
        .map(|entry| entry["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["assignee", "stage", "difficulty"]);

    assert_eq!(response.body["ticket"]["subject"], "Laptop does not boot at all");
    assert_eq!(response.body["ticket"]["stage"], "in_review");
    assert_eq!(response.body["ticket"]["difficulty"], "standard");
}

#[tokio::test]
async fn test_untracked_and_unchanged_updates_record_nothing() {
    let fixture = TestFixture::new().await;
    let people = people(&fixture).await;
    let id = create_ticket(&fixture, &people).await;

    let response = fixture
        .patch(
            &format!("/api/v1/tickets/{}", id),
            json!({ "subject": "New subject", "assignee_id": people.agent }),
        )
        .await;
    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["changes"].as_array().unwrap().len(), 0);

    let history = fixture.get(&format!("/api/v1/tickets/{}/history", id)).await;
    assert_eq!(history.body["entries"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_clearing_difficulty_is_recorded() {
    let fixture = TestFixture::new().await;
    let people = people(&fixture).await;
    let id = create_ticket(&fixture, &people).await;
    let standard = fixture.reference_id("difficulty", "standard");

    fixture
        .patch(
            &format!("/api/v1/tickets/{}", id),
            json!({ "difficulty_id": standard }),
        )
        .await;
    let response = fixture
        .patch(
            &format!("/api/v1/tickets/{}", id),
            json!({ "difficulty_id": null }),
        )
        .await;
    assert_status!(response, StatusCode::OK);

    let change = &response.body["changes"][0];
    assert_eq!(change["field"], "difficulty");
    assert_eq!(change["old_value"], standard.to_string());
    assert!(change["new_value"].is_null());
    assert!(response.body["ticket"].get("difficulty_id").is_none());
}

#[tokio::test]
async fn test_rejected_update_leaves_ticket_and_history_untouched() {
    let fixture = TestFixture::new().await;
    let people = people(&fixture).await;
    let id = create_ticket(&fixture, &people).await;
    let high = fixture.reference_id("priority", "high");

    // A priority ID is not a stage
    let response = fixture
        .patch(
            &format!("/api/v1/tickets/{}", id),
            json!({ "assignee_id": people.other_agent, "stage_id": high }),
        )
        .await;
    assert_status!(response, StatusCode::UNPROCESSABLE_ENTITY);

    let ticket = fixture.get(&format!("/api/v1/tickets/{}", id)).await;
    assert_eq!(ticket.body["assignee_id"], people.agent.as_str());
    assert_eq!(ticket.body["stage"], "open");

    let history = fixture.get(&format!("/api/v1/tickets/{}/history", id)).await;
    assert_eq!(history.body["entries"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_missing_ticket() {
    let fixture = TestFixture::new().await;

    let response = fixture
        .patch("/api/v1/tickets/missing", json!({ "subject": "x" }))
        .await;
    assert_status!(response, StatusCode::NOT_FOUND);

    let response = fixture.get("/api/v1/tickets/missing/history").await;
    assert_status!(response, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_history_snapshot_at_instant() {
    let fixture = TestFixture::new().await;
    let people = people(&fixture).await;
    let id = create_ticket(&fixture, &people).await;
    let in_progress = fixture.reference_id("stage", "in_progress");
    let closed = fixture.reference_id("stage", "closed");

    for stage_id in [in_progress, closed] {
        fixture
            .patch(
                &format!("/api/v1/tickets/{}", id),
                json!({ "stage_id": stage_id }),
            )
            .await;
    }

    let ticket = fixture.get(&format!("/api/v1/tickets/{}", id)).await;
    let history = fixture.get(&format!("/api/v1/tickets/{}/history", id)).await;
    let first_change = &history.body["entries"][0]["changed_at"];

    let at_creation = fixture
        .get(&format!(
            "/api/v1/tickets/{}/history?at={}",
            id,
            query_timestamp(&ticket.body["created_at"])
        ))
        .await;
    assert_status!(at_creation, StatusCode::OK);
    assert_eq!(at_creation.body["snapshot"]["stage"], "open");
    assert_eq!(
        at_creation.body["snapshot"]["assignee_id"],
        people.agent.as_str()
    );

    let after_first = fixture
        .get(&format!(
            "/api/v1/tickets/{}/history?at={}",
            id,
            query_timestamp(first_change)
        ))
        .await;
    assert_eq!(after_first.body["snapshot"]["stage"], "in_progress");

    let before_creation = fixture
        .get(&format!(
            "/api/v1/tickets/{}/history?at=2000-01-01T00:00:00Z",
            id
        ))
        .await;
    assert_status!(before_creation, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_list_tickets_by_stage_name() {
    let fixture = TestFixture::new().await;
    let people = people(&fixture).await;
    let first = create_ticket(&fixture, &people).await;
    create_ticket(&fixture, &people).await;
    let in_progress = fixture.reference_id("stage", "in_progress");

    fixture
        .patch(
            &format!("/api/v1/tickets/{}", first),
            json!({ "stage_id": in_progress }),
        )
        .await;

    let response = fixture.get("/api/v1/tickets?stage=in_progress").await;
    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["total"], 1);
    assert_eq!(response.body["tickets"][0]["id"], first.as_str());

    let response = fixture
        .get(&format!("/api/v1/tickets?assignee_id={}", people.agent))
        .await;
    assert_eq!(response.body["total"], 2);

    let response = fixture.get("/api/v1/tickets?stage=etapa").await;
    assert_status!(response, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_update_note_is_kept_in_history() {
    let fixture = TestFixture::new().await;
    let people = people(&fixture).await;
    let id = create_ticket(&fixture, &people).await;

    let response = fixture
        .patch(
            &format!("/api/v1/tickets/{}", id),
            json!({
                "assignee_id": people.other_agent,
                "stage_id": fixture.reference_id("stage", "in_progress"),
                "note": "Needs a hardware specialist"
            }),
        )
        .await;
    assert_status!(response, StatusCode::OK);
    let changes = response.body["changes"].as_array().unwrap();
    assert_eq!(changes.len(), 2);
    assert!(changes
        .iter()
        .all(|change| change["note"] == "Needs a hardware specialist"));

    let history = fixture.get(&format!("/api/v1/tickets/{}/history", id)).await;
    let entries = history.body["entries"].as_array().unwrap();
    assert_eq!(entries[0]["note"], "Needs a hardware specialist");
    assert_eq!(entries[1]["note"], "Needs a hardware specialist");
}

#[tokio::test]
async fn test_ticket_messages() {
    let fixture = TestFixture::new().await;
    let people = people(&fixture).await;
    let id = create_ticket(&fixture, &people).await;

    let response = fixture
        .post(
            &format!("/api/v1/tickets/{}/messages", id),
            json!({
                "author_id": people.agent,
                "subject": "Diagnosis",
                "body": "The disk is failing"
            }),
        )
        .await;
    assert_status!(response, StatusCode::CREATED);
    assert_eq!(response.body["author_id"], people.agent.as_str());

    let response = fixture
        .post(
            &format!("/api/v1/tickets/{}/messages", id),
            json!({
                "author_id": "nobody",
                "subject": "Hi",
                "body": "Anyone?"
            }),
        )
        .await;
    assert_status!(response, StatusCode::UNPROCESSABLE_ENTITY);

    let response = fixture
        .get(&format!("/api/v1/tickets/{}/messages", id))
        .await;
    assert_status!(response, StatusCode::OK);
    let messages = response.body["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0]["subject"], "Diagnosis");

    let response = fixture.get("/api/v1/tickets/missing/messages").await;
    assert_status!(response, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_changed_by_is_the_authenticated_user() {
    let fixture = TestFixture::with_config(TestConfig::with_api_key()).await;
    let people = people(&fixture).await;
    let id = create_ticket(&fixture, &people).await;

    let response = fixture
        .patch(
            &format!("/api/v1/tickets/{}", id),
            json!({ "assignee_id": people.other_agent }),
        )
        .await;
    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["changes"][0]["changed_by"], TEST_USER);
}

#[tokio::test]
async fn test_changed_by_is_empty_without_auth() {
    let fixture = TestFixture::new().await;
    let people = people(&fixture).await;
    let id = create_ticket(&fixture, &people).await;

    let response = fixture
        .patch(
            &format!("/api/v1/tickets/{}", id),
            json!({ "assignee_id": people.other_agent }),
        )
        .await;
    assert!(response.body["changes"][0]["changed_by"].is_null());
}

#[tokio::test]
async fn test_new_stage_is_usable_and_labelled() {
    let fixture = TestFixture::new().await;
    let people = people(&fixture).await;
    let id = create_ticket(&fixture, &people).await;

    let response = fixture
        .post("/api/v1/reference/stage", json!({ "name": "waiting_on_user" }))
        .await;
    assert_status!(response, StatusCode::CREATED);
    let waiting = response.body["id"].as_i64().unwrap();

    let response = fixture
        .patch(
            &format!("/api/v1/tickets/{}", id),
            json!({ "stage_id": waiting }),
        )
        .await;
    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["changes"][0]["new_label"], "waiting_on_user");

    let response = fixture
        .delete(&format!("/api/v1/reference/stage/{}", waiting))
        .await;
    assert_status!(response, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_deleting_collaborator_removes_their_tickets() {
    let fixture = TestFixture::new().await;
    let people = people(&fixture).await;
    let id = create_ticket(&fixture, &people).await;

    let response = fixture
        .delete(&format!("/api/v1/collaborators/{}", people.agent))
        .await;
    assert_status!(response, StatusCode::OK);

    let response = fixture.get(&format!("/api/v1/tickets/{}", id)).await;
    assert_status!(response, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_metrics_count_history_entries() {
    let fixture = TestFixture::new().await;
    let people = people(&fixture).await;
    let id = create_ticket(&fixture, &people).await;

    fixture
        .patch(
            &format!("/api/v1/tickets/{}", id),
            json!({ "assignee_id": people.other_agent }),
        )
        .await;

    let response = fixture.get("/api/v1/metrics").await;
    assert_status!(response, StatusCode::OK);
    let text = response.body.as_str().unwrap();
    assert!(text.contains("mesa_ticket_history_entries_total{field=\"assignee\"}"));
    assert!(text.contains("mesa_tickets_by_stage{stage=\"open\"}"));
}
