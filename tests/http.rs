use once_cell::sync::Lazy;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use std::net::TcpListener;
use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::time::sleep;

/// Wednesday.
const TODAY: &str = "2024-03-06";

#[derive(Debug, Deserialize)]
struct TodayResponse {
    date: String,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    completed: bool,
    current_streak: u32,
    best_streak: u32,
}

#[derive(Debug, Deserialize)]
struct StreakSummary {
    current: u32,
    best: u32,
}

#[derive(Debug, Deserialize)]
struct TrackerMonth {
    month: String,
    days: Vec<Value>,
    current_streak: u32,
    best_streak: u32,
    completion_rate: u8,
}

#[derive(Debug, Deserialize)]
struct PlannerEntry {
    id: String,
    time: String,
    activity: String,
    recurrence: String,
}

#[derive(Debug, Deserialize)]
struct DayPlan {
    date: String,
    occurrences: Vec<Occurrence>,
}

#[derive(Debug, Deserialize)]
struct Occurrence {
    entry_id: String,
    date: String,
    completed: bool,
}

#[derive(Debug, Deserialize)]
struct PlannerResponse {
    start_date: String,
    end_date: String,
    days: Vec<DayPlan>,
}

struct TestServer {
    base_url: String,
    child: Child,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

static TEST_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));
static SERVER: Lazy<Mutex<Option<Arc<TestServer>>>> = Lazy::new(|| Mutex::new(None));

#[cfg(unix)]
mod cleanup {
    use std::sync::atomic::{AtomicI32, Ordering};
    use std::sync::Once;

    static REGISTER: Once = Once::new();
    static PID: AtomicI32 = AtomicI32::new(0);

    pub fn register(pid: u32) {
        REGISTER.call_once(|| {
            PID.store(pid as i32, Ordering::SeqCst);
            unsafe {
                libc::atexit(on_exit);
            }
        });
    }

    extern "C" fn on_exit() {
        let pid = PID.load(Ordering::SeqCst);
        if pid > 0 {
            unsafe {
                libc::kill(pid, libc::SIGTERM);
            }
        }
    }
}

fn pick_free_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind random port");
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}

fn unique_data_path() -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let mut path = std::env::temp_dir();
    path.push(format!("seven_habits_http_{}_{}.json", std::process::id(), nanos));
    path.to_string_lossy().to_string()
}

async fn wait_until_ready(base_url: &str) {
    let client = Client::new();
    let deadline = Instant::now() + Duration::from_secs(3);
    loop {
        if let Ok(resp) = client.get(format!("{base_url}/api/today")).send().await {
            if resp.status().is_success() {
                return;
            }
        }
        if Instant::now() > deadline {
            panic!("server did not become ready");
        }
        sleep(Duration::from_millis(100)).await;
    }
}

async fn spawn_server() -> TestServer {
    let port = pick_free_port();
    let data_path = unique_data_path();
    let child = Command::new(env!("CARGO_BIN_EXE_seven_habits"))
        .env("PORT", port.to_string())
        .env("APP_DATA_PATH", data_path)
        .env("APP_TODAY", TODAY)
        .env("RUST_LOG", "info")
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .spawn()
        .expect("failed to spawn server");

    #[cfg(unix)]
    cleanup::register(child.id());

    let base_url = format!("http://127.0.0.1:{port}");
    wait_until_ready(&base_url).await;

    TestServer { base_url, child }
}

async fn shared_server() -> Arc<TestServer> {
    let mut guard = SERVER.lock().await;
    if let Some(server) = guard.as_ref() {
        return Arc::clone(server);
    }
    let server = Arc::new(spawn_server().await);
    *guard = Some(Arc::clone(&server));
    server
}

#[tokio::test]
async fn http_today_uses_pinned_clock() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;

    let today: TodayResponse = Client::new()
        .get(format!("{}/api/today", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(today.date, TODAY);
}

#[tokio::test]
async fn http_tracker_counts_streaks_and_rate() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();
    let base = format!("{}/api/kids/1/tracker", server.base_url);

    for date in ["2024-03-01", "2024-03-02", "2024-03-06"] {
        let response = client.put(format!("{base}/{date}")).send().await.unwrap();
        assert!(response.status().is_success());
    }

    let month: TrackerMonth = client
        .get(format!("{base}?month=2024-03"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(month.month, "2024-03");
    assert_eq!(month.days.len(), 31);
    assert_eq!(month.current_streak, 1);
    assert_eq!(month.best_streak, 2);
    // 3 of 6 elapsed days.
    assert_eq!(month.completion_rate, 50);

    let toggled: CompletionResponse = client
        .post(format!("{base}/2024-03-05/toggle"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(toggled.completed);
    assert_eq!(toggled.current_streak, 2);
    assert_eq!(toggled.best_streak, 2);
}

#[tokio::test]
async fn http_tracker_delete_lowers_streaks() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();
    let base = format!("{}/api/kids/5/tracker", server.base_url);

    for date in ["2024-03-05", TODAY] {
        let response = client.put(format!("{base}/{date}")).send().await.unwrap();
        assert!(response.status().is_success());
    }
    let before: StreakSummary = client
        .get(format!("{}/api/kids/5/streaks", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!((before.current, before.best), (2, 2));

    let cleared: CompletionResponse = client
        .delete(format!("{base}/2024-03-05"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(!cleared.completed);
    assert_eq!(cleared.current_streak, 1);
    assert_eq!(cleared.best_streak, 1);

    let future = client.delete(format!("{base}/2024-03-07")).send().await.unwrap();
    assert_eq!(future.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn http_tracker_refuses_future_dates() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;

    let response = Client::new()
        .put(format!("{}/api/kids/2/tracker/2024-03-07", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn http_rejects_invalid_scope() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    for path in ["/api/seniors/1/streaks", "/api/kids/9/streaks"] {
        let response = client
            .get(format!("{}{path}", server.base_url))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{path}");
    }
}

#[tokio::test]
async fn http_planner_projects_and_toggles_today_only() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();
    let base = format!("{}/api/teens/3/planner", server.base_url);

    let response = client
        .post(&base)
        .json(&json!({
            "date": "2024-03-04",
            "time": "16:00",
            "activity": "Study the most important subject first",
            "recurrence": "M/W/F"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let entry: PlannerEntry = response.json().await.unwrap();
    assert_eq!(entry.recurrence, "Mon/Wed/Fri");

    let week: PlannerResponse = client
        .get(format!("{base}?period=week&date=2024-03-06"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(week.start_date, "2024-03-03");
    assert_eq!(week.end_date, "2024-03-09");
    assert_eq!(week.days.len(), 7);
    let dates: Vec<_> = week
        .days
        .iter()
        .flat_map(|day| day.occurrences.iter())
        .filter(|o| o.entry_id == entry.id)
        .map(|o| o.date.clone())
        .collect();
    assert_eq!(dates, vec!["2024-03-04", "2024-03-06", "2024-03-08"]);
    let samples = week
        .days
        .iter()
        .flat_map(|day| day.occurrences.iter())
        .filter(|o| o.entry_id.starts_with("sample-"))
        .count();
    assert_eq!(samples, 3);

    let refused = client
        .post(format!("{base}/{}/toggle", entry.id))
        .json(&json!({ "date": "2024-03-04" }))
        .send()
        .await
        .unwrap();
    assert_eq!(refused.status(), StatusCode::CONFLICT);

    let toggled: Occurrence = client
        .post(format!("{base}/{}/toggle", entry.id))
        .json(&json!({ "date": TODAY }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(toggled.entry_id, entry.id);
    assert!(toggled.completed);

    let next_week: PlannerResponse = client
        .get(format!("{base}?period=week&date=2024-03-06&offset=1"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(next_week.start_date, "2024-03-10");
    let wednesday = next_week
        .days
        .iter()
        .find(|day| day.date == "2024-03-13")
        .expect("missing wednesday");
    assert_eq!(wednesday.occurrences.len(), 1);
    assert_eq!(wednesday.occurrences[0].entry_id, entry.id);
    assert!(!wednesday.occurrences[0].completed);
}

#[tokio::test]
async fn http_planner_starts_with_tier_samples() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();
    let base = format!("{}/api/kids/6/planner", server.base_url);

    let week: PlannerResponse = client.get(&base).send().await.unwrap().json().await.unwrap();
    assert_eq!(week.start_date, "2024-03-03");
    let seeded: Vec<_> = week
        .days
        .iter()
        .flat_map(|day| day.occurrences.iter())
        .map(|o| (o.entry_id.as_str(), o.date.as_str()))
        .collect();
    assert_eq!(
        seeded,
        vec![
            ("sample-0", "2024-03-04"),
            ("sample-1", "2024-03-06"),
            ("sample-2", "2024-03-09"),
        ]
    );

    let toggled: Occurrence = client
        .post(format!("{base}/sample-1/toggle"))
        .json(&json!({ "date": TODAY }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(toggled.completed);

    let entries: Vec<PlannerEntry> = client
        .get(format!("{base}/entries"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0].time, "15:30");
    assert_eq!(
        entries[0].activity,
        "Practice being proactive by cleaning my room without being asked"
    );
}

#[tokio::test]
async fn http_planner_rejects_weeks_past_the_calendar() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();
    let base = format!("{}/api/kids/7/planner", server.base_url);

    let week = client
        .get(format!("{base}?date=%2B262142-12-31"))
        .send()
        .await
        .unwrap();
    assert_eq!(week.status(), StatusCode::BAD_REQUEST);

    let month: PlannerResponse = client
        .get(format!("{base}?period=month&date=%2B262142-12-31"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(month.days.len(), 31);

    let alive = client
        .get(format!("{}/api/today", server.base_url))
        .send()
        .await
        .unwrap();
    assert!(alive.status().is_success());
}

#[tokio::test]
async fn http_planner_edit_and_delete() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();
    let base = format!("{}/api/adults/4/planner", server.base_url);

    let blank = client
        .post(&base)
        .json(&json!({ "date": "2024-03-06", "time": "12:00", "activity": "  " }))
        .send()
        .await
        .unwrap();
    assert_eq!(blank.status(), StatusCode::BAD_REQUEST);

    let entry: PlannerEntry = client
        .post(&base)
        .json(&json!({ "date": "2024-03-06", "time": "12:00", "activity": "Lunch meeting" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(entry.recurrence, "none");

    let edited: PlannerEntry = client
        .patch(format!("{base}/{}", entry.id))
        .json(&json!({ "time": "07:30", "activity": "Morning planning session" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(edited.id, entry.id);
    assert_eq!(edited.time, "07:30");
    assert_eq!(edited.activity, "Morning planning session");

    let deleted = client
        .delete(format!("{base}/{}", entry.id))
        .send()
        .await
        .unwrap();
    assert_eq!(deleted.status(), StatusCode::NO_CONTENT);

    let entries: Vec<PlannerEntry> = client
        .get(format!("{base}/entries"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(entries.iter().all(|e| e.id != entry.id));
    assert!(entries.iter().all(|e| e.id.starts_with("sample-")));

    let missing = client
        .delete(format!("{base}/{}", entry.id))
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn http_mission_statement_round_trip() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();
    let base = format!("{}/api/adults/mission", server.base_url);

    let saved: Value = client
        .put(&base)
        .json(&json!({ "statement": "My core purpose in life is to serve." }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(saved["updated_on"], TODAY);

    let loaded: Value = client.get(&base).send().await.unwrap().json().await.unwrap();
    assert_eq!(loaded["statement"], "My core purpose in life is to serve.");

    let prompts: Value = client
        .get(format!("{base}/prompts"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(prompts["prompts"].as_array().map(Vec::len), Some(5));
}

#[tokio::test]
async fn http_index_renders() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;

    let body = Client::new()
        .get(format!("{}/", server.base_url))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(body.contains("The 7 Habits"));
    assert!(body.contains("Be Proactive"));
}
