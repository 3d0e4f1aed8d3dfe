use std::process::{Child, Command, Stdio};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::OnceLock;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::StatusCode;

static SERVER: OnceLock<TestServer> = OnceLock::new();
static EMAIL_SEQ: AtomicU32 = AtomicU32::new(0);

/// Integration tests need a reachable Postgres; without one they no-op so
/// plain `cargo test` still passes on a machine with no database
pub fn live_env() -> bool {
    let _ = dotenvy::dotenv();
    std::env::var("DATABASE_URL").is_ok()
}

pub struct TestServer {
    pub base_url: String,
    #[allow(dead_code)]
    child: Child,
}

impl TestServer {
    fn spawn() -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        // Spawn the already-built binary to keep start fast during tests
        // Assumes debug profile; adjust if you run tests with --release
        let mut cmd = Command::new("target/debug/lead-api-rust");
        cmd.env("LEAD_API_PORT", port.to_string())
            // Rate limiting off so test volume never trips 429s
            .env("API_ENABLE_RATE_LIMITING", "false")
            .env("JWT_SECRET", "integration-test-secret")
            .env("SECURITY_SECURE_COOKIES", "false")
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        // Inherit the rest of the environment so the server sees DATABASE_URL
        let child = cmd.spawn().context("failed to spawn server binary")?;

        Ok(Self { base_url, child })
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline {
                break;
            }
            let url = format!("{}/health", self.base_url);
            if let Ok(resp) = client.get(&url).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(150)).await;
        }
        anyhow::bail!(
            "server did not become ready on {} within {:?}",
            self.base_url,
            timeout
        )
    }
}

pub async fn ensure_server() -> Result<&'static TestServer> {
    let server = SERVER.get_or_init(|| TestServer::spawn().expect("failed to spawn server binary"));
    server.wait_ready(Duration::from_secs(10)).await?;
    Ok(server)
}

/// Client with a cookie jar, acting as one browser session
pub fn session_client() -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder().cookie_store(true).build()?)
}

/// Unique per process and per call, so reruns never collide on the
/// database's unique email constraints
pub fn unique_email(prefix: &str) -> String {
    let seq = EMAIL_SEQ.fetch_add(1, Ordering::Relaxed);
    format!("{}-{}-{}@test.example.com", prefix, std::process::id(), seq)
}

/// Register a fresh account and return its logged-in session client
pub async fn register_user(server: &TestServer, email: &str) -> Result<reqwest::Client> {
    let client = session_client()?;
    let res = client
        .post(format!("{}/auth/register", server.base_url))
        .json(&serde_json::json!({
            "email": email,
            "password": "password123",
            "firstName": "Test",
            "lastName": "User",
        }))
        .send()
        .await?;
    anyhow::ensure!(
        res.status() == StatusCode::CREATED,
        "registration failed: {} {}",
        res.status(),
        res.text().await.unwrap_or_default()
    );
    Ok(client)
}
