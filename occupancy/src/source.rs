use std::future::Future;

use crate::error::Result;
use crate::structs::Event;

/// Where an event collection comes from.
pub trait EventSource {
    fn fetch(&self) -> impl Future<Output = Result<Vec<Event>>> + Send;

    /// Human-readable origin, used in log and error messages.
    fn describe(&self) -> String;
}

/// A JSON document on disk holding the collection.
#[cfg(feature = "serde")]
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: std::path::PathBuf,
}

#[cfg(feature = "serde")]
impl JsonFileSource {
    pub fn new<P: Into<std::path::PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }
}

#[cfg(feature = "serde")]
impl EventSource for JsonFileSource {
    async fn fetch(&self) -> Result<Vec<Event>> {
        log::debug!("reading events from {}", self.path.display());
        let json = tokio::fs::read_to_string(&self.path).await?;
        Ok(crate::parse_events(json)?)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// The backend's event endpoint.
#[cfg(feature = "http")]
#[derive(Debug, Clone)]
pub struct HttpSource {
    url: String,
    client: reqwest::Client,
}

#[cfg(feature = "http")]
impl HttpSource {
    pub fn new<S: Into<String>>(url: S) -> Self {
        Self {
            url: url.into(),
            client: reqwest::Client::new(),
        }
    }
}

#[cfg(feature = "http")]
impl EventSource for HttpSource {
    async fn fetch(&self) -> Result<Vec<Event>> {
        log::debug!("requesting events from {}", self.url);
        let response = self.client.get(&self.url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(crate::Error::Status {
                url: self.url.clone(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        Ok(crate::parse_events(body)?)
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}

/// A file or URL chosen from a location string.
#[cfg(feature = "serde")]
#[derive(Debug, Clone)]
pub enum AnySource {
    File(JsonFileSource),
    #[cfg(feature = "http")]
    Http(HttpSource),
}

/// `http://` and `https://` locations become [`HttpSource`]s (with the `http`
/// feature), anything else a [`JsonFileSource`].
#[cfg(feature = "serde")]
pub fn source_from_location(location: &str) -> AnySource {
    #[cfg(feature = "http")]
    if location.starts_with("http://") || location.starts_with("https://") {
        return AnySource::Http(HttpSource::new(location));
    }

    AnySource::File(JsonFileSource::new(location))
}

#[cfg(feature = "serde")]
impl EventSource for AnySource {
    async fn fetch(&self) -> Result<Vec<Event>> {
        match self {
            Self::File(source) => source.fetch().await,
            #[cfg(feature = "http")]
            Self::Http(source) => source.fetch().await,
        }
    }

    fn describe(&self) -> String {
        match self {
            Self::File(source) => source.describe(),
            #[cfg(feature = "http")]
            Self::Http(source) => source.describe(),
        }
    }
}

#[cfg(all(test, feature = "serde"))]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::Error;

    #[tokio::test]
    async fn reads_events_from_json_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"id": 1, "name": "Wedding", "start": "2024-06-01", "end": "2024-06-02"}}]"#
        )
        .unwrap();

        let source = JsonFileSource::new(file.path());
        let events = source.fetch().await.unwrap();

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].name, "Wedding");
    }

    #[tokio::test]
    async fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let source = JsonFileSource::new(dir.path().join("absent.json"));

        assert!(matches!(source.fetch().await, Err(Error::Io(_))));
    }

    #[tokio::test]
    async fn invalid_json_is_a_json_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();

        let source = JsonFileSource::new(file.path());
        assert!(matches!(source.fetch().await, Err(Error::Json(_))));
    }

    #[test]
    fn plain_paths_become_file_sources() {
        assert!(matches!(
            source_from_location("events.json"),
            AnySource::File(_)
        ));
    }

    #[cfg(feature = "http")]
    #[test]
    fn urls_become_http_sources() {
        let source = source_from_location("https://backend.example/api/events");
        assert!(matches!(source, AnySource::Http(_)));
        assert_eq!(source.describe(), "https://backend.example/api/events");
    }

    #[cfg(feature = "http")]
    const BACKEND_EVENTS: &str = r#"[
        {"id": 1, "name": "Wedding", "start": "2024-06-01", "end": "2024-06-02"},
        {"id": 2, "name": "Conference", "start": "2024-06-05", "end": "2024-06-05"}
    ]"#;

    #[cfg(feature = "http")]
    #[tokio::test]
    async fn http_source_decodes_an_event_array() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/events")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(BACKEND_EVENTS)
            .create_async()
            .await;

        let source = HttpSource::new(format!("{}/api/events", server.url()));
        let events = source.fetch().await.unwrap();

        mock.assert_async().await;
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].name, "Conference");
    }

    #[cfg(feature = "http")]
    #[tokio::test]
    async fn http_source_decodes_a_wrapped_collection() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/events")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(format!(r#"{{"events": {BACKEND_EVENTS}}}"#))
            .create_async()
            .await;

        let source = HttpSource::new(format!("{}/api/events", server.url()));
        let events = source.fetch().await.unwrap();

        assert_eq!(events.len(), 2);
        assert_eq!(events[0].id.as_str(), "1");
    }

    #[cfg(feature = "http")]
    #[tokio::test]
    async fn http_error_status_is_reported_with_its_url() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/events")
            .with_status(503)
            .with_body("maintenance")
            .create_async()
            .await;

        let source = HttpSource::new(format!("{}/api/events", server.url()));
        match source.fetch().await {
            Err(Error::Status { url, status }) => {
                assert_eq!(status, 503);
                assert!(url.ends_with("/api/events"), "{url}");
            }
            other => panic!("expected a status error, got {other:?}"),
        }
    }
}
