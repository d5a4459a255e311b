//! DummyJSON Example
//!
//! Paginates a product listing and logs in against canned responses, then
//! checks what was sent. Run with `RUST_LOG=debug` to see every layer.

// Example-specific lint allowances
#![allow(missing_docs)]
#![allow(clippy::print_stdout)]

use courier::fake::{AnyRequest, FakeResponse};
use courier::middleware::{METRIC_REQUEST_DURATION, METRIC_REQUESTS_TOTAL};
use courier::prelude::*;
use metrics_util::debugging::{DebugValue, DebuggingRecorder};
use serde_json::json;
use tracing::info;

const PAGE_SIZE: u64 = 10;
const TOTAL: u64 = 34;

// ============================================================================
// Data Types
// ============================================================================

/// A catalogue entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: u64,
    pub title: String,
    pub price: f64,
}

/// One page of the catalogue.
#[derive(Debug, Clone, Deserialize)]
pub struct ProductPage {
    pub products: Vec<Product>,
    pub total: u64,
    pub skip: u64,
    pub limit: u64,
}

/// Login response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub access_token: String,
}

// ============================================================================
// Canned API
// ============================================================================

#[allow(clippy::cast_precision_loss)]
fn catalogue_page(skip: u64) -> serde_json::Value {
    let end = (skip + PAGE_SIZE).min(TOTAL);
    let products: Vec<Product> = (skip..end)
        .map(|index| Product {
            id: index + 1,
            title: format!("Product #{}", index + 1),
            price: 9.99 + index as f64,
        })
        .collect();
    json!({
        "products": products,
        "total": TOTAL,
        "skip": skip,
        "limit": PAGE_SIZE,
    })
}

fn stub_api(client: &mut Client) {
    let listing = format!("https://dummyjson.com/products?limit={PAGE_SIZE}");
    client.stub_response(listing.clone(), catalogue_page(0), 200, Headers::new());
    let skips = (1..).map(|page| page * PAGE_SIZE).take_while(|skip| *skip < TOTAL);
    for skip in skips {
        client.stub_response(
            format!("https://dummyjson.com/products?skip={skip}&limit={PAGE_SIZE}"),
            catalogue_page(skip),
            200,
            Headers::new(),
        );
    }

    client
        .stub_with_matcher(
            |request: &Request| request.method() == Method::Post,
            FakeResponse::json(json!({"accessToken": "demo-token"})),
        )
        .stub_with_matcher(AnyRequest, FakeResponse::new(404, json!({"message": "not found"})));
}

// ============================================================================
// Main
// ============================================================================

fn run() -> Result<()> {
    let mut client = Client::builder()
        .base_url("https://dummyjson.com")
        .pagination(SkipLimitPolicy::new())
        .with_logging()
        .with_metrics()
        .fake()
        .build()?;
    stub_api(&mut client);

    let first = client.get("/products", &[("limit", PAGE_SIZE)])?;
    let mut titles = Vec::new();
    client.for_each_page(first, |page| -> Result<()> {
        let page: ProductPage = page.json()?;
        info!(skip = page.skip, limit = page.limit, total = page.total, "page received");
        titles.extend(page.products.into_iter().map(|product| product.title));
        Ok(())
    })?;
    println!("fetched {} products", titles.len());

    let session: Session = client
        .post(
            "/auth/login",
            &json!({"username": "emilys", "password": "emilyspass"}),
        )?
        .json()?;
    println!("logged in with token {}", session.access_token);

    let missing = client.get("/products/999", &NO_PARAMS)?;
    println!("GET /products/999 -> {}", missing.status());

    client.assert_sent_count(6);
    client.assert_sent(|request, _| request.url().query() == Some("skip=30&limit=10"));
    client.assert_not_sent(|request, _| request.method() == Method::Delete);
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();
    metrics::with_local_recorder(&recorder, run)?;

    for (key, _, _, value) in snapshotter.snapshot().into_vec() {
        let labels: Vec<String> = key
            .key()
            .labels()
            .map(|label| format!("{}={}", label.key(), label.value()))
            .collect();
        match (key.key().name(), value) {
            (METRIC_REQUESTS_TOTAL, DebugValue::Counter(count)) => {
                println!("requests [{}]: {count}", labels.join(", "));
            }
            (METRIC_REQUEST_DURATION, DebugValue::Histogram(durations)) => {
                let total: f64 = durations.iter().map(|value| value.into_inner()).sum();
                println!("duration [{}]: {total:.6}s over {}", labels.join(", "), durations.len());
            }
            _ => {}
        }
    }
    Ok(())
}
