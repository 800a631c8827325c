use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use harvest_core::{Record, RunStatus};
use harvest_engine::ReadModel;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

#[derive(Clone)]
pub struct ApiState {
    read_model: ReadModel,
    status: watch::Receiver<RunStatus>,
    default_count: usize,
}

impl ApiState {
    pub fn new(
        read_model: ReadModel,
        status: watch::Receiver<RunStatus>,
        default_count: usize,
    ) -> Self {
        Self {
            read_model,
            status,
            default_count,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct RecentQuery {
    count: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    ready: bool,
    records: usize,
    run: RunStatus,
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/articles", get(recent_articles))
        .route("/news", get(recent_articles))
        .route("/status", get(run_status))
        .with_state(state)
}

/// `GET /articles?count=N`: newest first; zero or negative counts give `[]`.
async fn recent_articles(
    State(state): State<ApiState>,
    Query(query): Query<RecentQuery>,
) -> Json<Vec<Record>> {
    let count = match query.count {
        Some(count) => usize::try_from(count).unwrap_or(0),
        None => state.default_count,
    };
    Json(state.read_model.recent(count))
}

async fn run_status(State(state): State<ApiState>) -> Json<StatusResponse> {
    let run = state.status.borrow().clone();
    Json(StatusResponse {
        ready: run.is_ready(),
        records: state.read_model.len(),
        run,
    })
}

#[cfg(test)]
mod tests {
    use super::{recent_articles, run_status, ApiState, RecentQuery};
    use axum::extract::{Query, State};
    use chrono::{NaiveDate, TimeZone, Utc};
    use harvest_core::{fingerprint, Record, RunStatus};
    use harvest_engine::{JsonFileBackend, Store};
    use pretty_assertions::assert_eq;
    use tokio::sync::watch;

    fn record(title: &str, day: u32) -> Record {
        let date_text = format!("{day:02}.05.2024");
        Record {
            id: fingerprint(title, &date_text),
            fetched_at: Utc.with_ymd_and_hms(2024, 5, 20, 0, 0, 0).unwrap(),
            published_at: NaiveDate::from_ymd_opt(2024, 5, day)
                .unwrap()
                .and_hms_opt(12, 0, 0)
                .unwrap(),
            title: title.to_string(),
            excerpt: String::new(),
            url: format!("https://news.example/{day}"),
            image_url: format!("https://news.example/{day}.jpg"),
            content: String::new(),
        }
    }

    async fn state_with(
        days: &[u32],
        status: RunStatus,
    ) -> (ApiState, watch::Sender<RunStatus>, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let backend = JsonFileBackend::new(dir.path().join("articles.json"));
        let mut store = Store::open(Box::new(backend)).await.unwrap();
        for &day in days {
            store.upsert(record(&format!("day {day}"), day));
        }
        store.commit().await.unwrap();
        let (tx, rx) = watch::channel(status);
        (ApiState::new(store.read_model(), rx, 2), tx, dir)
    }

    fn titles(records: &[Record]) -> Vec<String> {
        records.iter().map(|r| r.title.clone()).collect()
    }

    #[tokio::test]
    async fn articles_default_to_configured_count() {
        let (state, _tx, _dir) = state_with(&[1, 3, 2], RunStatus::Completed).await;
        let body = recent_articles(State(state), Query(RecentQuery::default())).await;
        assert_eq!(titles(&body.0), vec!["day 3", "day 2"]);
    }

    #[tokio::test]
    async fn articles_honour_explicit_count() {
        let (state, _tx, _dir) = state_with(&[1, 3, 2], RunStatus::Completed).await;
        let query = |count| Query(RecentQuery { count: Some(count) });

        let body = recent_articles(State(state.clone()), query(10)).await;
        assert_eq!(titles(&body.0), vec!["day 3", "day 2", "day 1"]);

        let body = recent_articles(State(state.clone()), query(0)).await;
        assert!(body.0.is_empty());

        let body = recent_articles(State(state), query(-4)).await;
        assert!(body.0.is_empty());
    }

    #[tokio::test]
    async fn status_reports_ready_flag_and_follows_updates() {
        let (state, tx, _dir) = state_with(&[1], RunStatus::Running).await;

        let body = run_status(State(state.clone())).await;
        assert!(!body.0.ready);
        assert_eq!(body.0.records, 1);

        tx.send_replace(RunStatus::Completed);
        let body = run_status(State(state)).await;
        assert!(body.0.ready);
        let json = serde_json::to_value(&body.0).unwrap();
        assert_eq!(json["run"]["state"], "completed");
    }
}
