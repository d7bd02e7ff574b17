use super::*;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::types::{FilmDetail, FilmSummary, SessionHandshake};

const FAR_FUTURE: u64 = u64::MAX / 2;

/// Scripted stand-in for the remote service.
struct FakeApi {
    handshake: Option<SessionHandshake>,
    handshake_error: bool,
    films: Vec<FilmSummary>,
    handshakes: AtomicUsize,
    searches: AtomicUsize,
}

impl FakeApi {
    fn with_films(films: Vec<FilmSummary>) -> Self {
        Self {
            handshake: Some(SessionHandshake {
                session_key: "fresh-key".to_string(),
                valid_till: FAR_FUTURE,
            }),
            handshake_error: false,
            films,
            handshakes: AtomicUsize::new(0),
            searches: AtomicUsize::new(0),
        }
    }

    fn empty_handshake() -> Self {
        Self {
            handshake: None,
            ..Self::with_films(Vec::new())
        }
    }

    fn unreachable() -> Self {
        Self {
            handshake_error: true,
            ..Self::with_films(Vec::new())
        }
    }
}

#[async_trait::async_trait]
impl SessionApi for Arc<FakeApi> {
    async fn start_session(
        &self,
        _api_key: &str,
    ) -> Result<Option<SessionHandshake>, ScrapeError> {
        self.handshakes.fetch_add(1, Ordering::SeqCst);
        if self.handshake_error {
            return Err(ScrapeError::Session("connection refused".to_string()));
        }
        Ok(self.handshake.clone())
    }

    async fn search_films(
        &self,
        _session_key: &str,
        _title: &str,
    ) -> Result<Vec<FilmSummary>, ScrapeError> {
        self.searches.fetch_add(1, Ordering::SeqCst);
        Ok(self.films.clone())
    }

    async fn film_details(
        &self,
        _session_key: &str,
        film_id: &str,
    ) -> Result<FilmDetail, ScrapeError> {
        Ok(FilmDetail {
            title: format!("film {}", film_id),
            ..Default::default()
        })
    }
}

fn summary(id: &str, title: &str, year: Option<&str>) -> FilmSummary {
    FilmSummary {
        film_id: id.to_string(),
        title: title.to_string(),
        year: year.map(str::to_string),
    }
}

fn session_path(dir: &tempfile::TempDir) -> std::path::PathBuf {
    dir.path().join("moviemeter.session")
}

#[test]
fn token_line_round_trip() {
    let token = SessionToken {
        key: "abc".to_string(),
        expires_at: 1000,
        call_count: 5,
    };
    assert_eq!(SessionToken::parse(&token.to_line()), Some(token));
}

#[test]
fn malformed_lines_mean_no_session() {
    assert_eq!(SessionToken::parse(""), None);
    assert_eq!(SessionToken::parse("just-a-key"), None);
    assert_eq!(SessionToken::parse("key,notanumber,3"), None);
    assert_eq!(SessionToken::parse("key,100,3,extra"), None);
    assert_eq!(SessionToken::parse(",100,3"), None);
}

#[test]
fn validity_is_a_pure_check() {
    let token = SessionToken {
        key: "abc".to_string(),
        expires_at: 1000,
        call_count: 5,
    };
    assert!(token.is_valid(999));
    assert!(token.is_valid(999));
    assert_eq!(token.call_count, 5);

    assert!(!token.is_valid(1000));
    assert!(!token.is_valid(2000));

    let exhausted = SessionToken {
        call_count: SESSION_CALL_BUDGET,
        ..token
    };
    assert!(!exhausted.is_valid(999));
}

#[tokio::test]
async fn persisted_session_is_resumed() {
    let dir = tempfile::tempdir().unwrap();
    let path = session_path(&dir);
    std::fs::write(&path, format!("abc,{},5\n", FAR_FUTURE)).unwrap();

    let api = Arc::new(FakeApi::with_films(vec![summary("1", "Heat", None)]));
    let client = SessionClient::open(Box::new(api.clone()), "api-key", &path);

    assert!(client.is_authenticated().await);
    assert_eq!(client.call_count().await, Some(5));

    let film = client.get_by_title("Heat").await.unwrap();
    assert_eq!(film.film_id, "1");
    // The resumed session was still valid, so no handshake happened.
    assert_eq!(api.handshakes.load(Ordering::SeqCst), 0);
    assert_eq!(client.call_count().await, Some(6));
}

#[tokio::test]
async fn repeated_validity_checks_do_not_consume_budget() {
    let dir = tempfile::tempdir().unwrap();
    let path = session_path(&dir);
    std::fs::write(&path, format!("abc,{},5\n", FAR_FUTURE)).unwrap();

    let api = Arc::new(FakeApi::with_films(Vec::new()));
    let client = SessionClient::open(Box::new(api.clone()), "api-key", &path);

    for _ in 0..10 {
        assert!(client.is_authenticated().await);
    }
    assert_eq!(client.call_count().await, Some(5));
    assert_eq!(api.handshakes.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn missing_file_starts_unauthenticated_and_handshakes_on_demand() {
    let dir = tempfile::tempdir().unwrap();
    let path = session_path(&dir);

    let api = Arc::new(FakeApi::with_films(vec![summary("7", "Heat", None)]));
    let client = SessionClient::open(Box::new(api.clone()), "api-key", &path);
    assert!(!client.is_authenticated().await);

    let film = client.get_by_title("Heat").await.unwrap();
    assert_eq!(film.film_id, "7");
    assert_eq!(api.handshakes.load(Ordering::SeqCst), 1);
    assert!(client.is_authenticated().await);
    assert_eq!(client.call_count().await, Some(1));
}

#[tokio::test]
async fn every_call_is_persisted_immediately() {
    let dir = tempfile::tempdir().unwrap();
    let path = session_path(&dir);

    let api = Arc::new(FakeApi::with_films(vec![summary("7", "Heat", None)]));
    let client = SessionClient::open(Box::new(api.clone()), "api-key", &path);

    client.get_by_title("Heat").await.unwrap();
    let on_disk = SessionToken::parse(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(on_disk.key, "fresh-key");
    assert_eq!(on_disk.call_count, 1);

    client.get_by_title("Heat").await.unwrap();
    let on_disk = SessionToken::parse(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(on_disk.call_count, 2);
}

#[tokio::test]
async fn fresh_client_resumes_where_the_last_one_stopped() {
    let dir = tempfile::tempdir().unwrap();
    let path = session_path(&dir);

    let api = Arc::new(FakeApi::with_films(vec![summary("7", "Heat", None)]));
    let first = SessionClient::open(Box::new(api.clone()), "api-key", &path);
    first.get_by_title("Heat").await.unwrap();
    drop(first);

    let second = SessionClient::open(Box::new(api.clone()), "api-key", &path);
    assert!(second.is_authenticated().await);
    assert_eq!(second.call_count().await, Some(1));
}

#[tokio::test]
async fn exhausted_budget_forces_a_new_handshake() {
    let dir = tempfile::tempdir().unwrap();
    let path = session_path(&dir);
    std::fs::write(
        &path,
        format!("old-key,{},{}\n", FAR_FUTURE, SESSION_CALL_BUDGET),
    )
    .unwrap();

    let api = Arc::new(FakeApi::with_films(vec![summary("7", "Heat", None)]));
    let client = SessionClient::open(Box::new(api.clone()), "api-key", &path);
    assert!(!client.is_authenticated().await);

    client.get_by_title("Heat").await.unwrap();
    assert_eq!(api.handshakes.load(Ordering::SeqCst), 1);
    // New session starts counting from zero again.
    assert_eq!(client.call_count().await, Some(1));
}

#[tokio::test]
async fn expired_token_forces_a_new_handshake() {
    let dir = tempfile::tempdir().unwrap();
    let path = session_path(&dir);
    std::fs::write(&path, "old-key,1000,3\n").unwrap();

    let api = Arc::new(FakeApi::with_films(vec![summary("7", "Heat", None)]));
    let client = SessionClient::open(Box::new(api.clone()), "api-key", &path);
    assert!(!client.is_authenticated().await);

    client.get_by_title("Heat").await.unwrap();
    assert_eq!(api.handshakes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn empty_handshake_leaves_the_client_unauthenticated() {
    let dir = tempfile::tempdir().unwrap();
    let path = session_path(&dir);

    let api = Arc::new(FakeApi::empty_handshake());
    let client = SessionClient::open(Box::new(api.clone()), "api-key", &path);

    assert!(client.get_by_title("Heat").await.is_none());
    assert!(!client.is_authenticated().await);
    // The failed handshake never reached the search call.
    assert_eq!(api.searches.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn unreachable_backend_degrades_to_empty_results() {
    let dir = tempfile::tempdir().unwrap();
    let path = session_path(&dir);

    let api = Arc::new(FakeApi::unreachable());
    let client = SessionClient::open(Box::new(api.clone()), "api-key", &path);

    for _ in 0..3 {
        assert!(client.get_by_title("Heat").await.is_none());
        assert!(!client.is_authenticated().await);
    }
    assert_eq!(api.handshakes.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn year_match_is_preferred_over_first_result() {
    let dir = tempfile::tempdir().unwrap();
    let path = session_path(&dir);
    std::fs::write(&path, format!("abc,{},0\n", FAR_FUTURE)).unwrap();

    let api = Arc::new(FakeApi::with_films(vec![
        summary("1", "Heat", Some("1972")),
        summary("2", "Heat", Some("1995")),
    ]));
    let client = SessionClient::open(Box::new(api.clone()), "api-key", &path);

    let film = client
        .get_by_title_and_year("Heat", Some("1995"))
        .await
        .unwrap();
    assert_eq!(film.film_id, "2");

    let film = client
        .get_by_title_and_year("Heat", Some("2003"))
        .await
        .unwrap();
    assert_eq!(film.film_id, "1");
}
