//! Basic usage example of the cache contract.
//!
//! The same caller code runs against the in-memory backend and against a
//! programmed `MockCache` that injects a backend failure.

use cache_contract::mock::{Matcher, Method, MockCache};
use cache_contract::{args, Cache, Context, Error, InMemoryCache, Result, Value};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Example entity: Employment
#[derive(Clone, Serialize, Deserialize, Debug)]
struct Employment {
    id: String,
    employer_name: String,
    salary: f64,
}

/// Simulated database lookup.
fn fetch_employment(id: &str) -> Option<Employment> {
    println!("  [DB] Fetching employment: {}", id);
    match id {
        "emp_001" => Some(Employment {
            id: id.to_string(),
            employer_name: "Acme Corp".to_string(),
            salary: 75000.0,
        }),
        "emp_002" => Some(Employment {
            id: id.to_string(),
            employer_name: "Tech Inc".to_string(),
            salary: 95000.0,
        }),
        _ => None,
    }
}

/// Read-through lookup written once against the contract.
async fn load_employment<C: Cache>(
    cache: &C,
    ctx: &Context,
    id: &str,
) -> Result<Option<Employment>> {
    let key = format!("employment:{}", id);

    match cache.get(ctx, &key).await {
        Ok(raw) => {
            let employment = serde_json::from_str(&raw)?;
            return Ok(Some(employment));
        }
        Err(Error::NotFound) => {}
        Err(e) => return Err(e),
    }

    let Some(employment) = fetch_employment(id) else {
        return Ok(None);
    };
    cache
        .set_with_expiration(ctx, &key, Value::json(&employment)?, Duration::from_secs(300))
        .await?;
    Ok(Some(employment))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Debug)
        .try_init()
        .ok();

    println!("\n=== Cache Contract - Basic Example ===\n");

    // 1. Initialize cache backend
    println!("1. Initializing in-memory cache backend...");
    let cache = InMemoryCache::new();
    let ctx = Context::with_timeout(Duration::from_secs(5));
    println!("   ✓ Cache backend ready\n");

    // 2. First request - cache miss, fetch from database
    println!("2. First request for employment (emp_001):");
    if let Some(emp) = load_employment(&cache, &ctx, "emp_001").await? {
        println!(
            "   ✓ Employment loaded: {} from {} (${:.2})\n",
            emp.employer_name, emp.id, emp.salary
        );
    }

    // 3. Second request - cache hit, no database access
    println!("3. Second request for same employment (emp_001):");
    if let Some(emp) = load_employment(&cache, &ctx, "emp_001").await? {
        println!(
            "   ✓ Employment loaded from cache: {} (${:.2})\n",
            emp.employer_name, emp.salary
        );
    }

    // 4. Unknown id - nothing cached
    println!("4. Request for unknown employment (emp_003):");
    if load_employment(&cache, &ctx, "emp_003").await?.is_none() {
        println!("   ✓ Not found anywhere, nothing cached\n");
    }

    // 5. Pattern invalidation
    println!("5. Invalidating every employment entry:");
    load_employment(&cache, &ctx, "emp_002").await?;
    println!("   keys before: {:?}", cache.keys(&ctx, "employment:*").await?);
    cache.del_with_pattern(&ctx, "employment:*").await?;
    println!("   keys after:  {:?}\n", cache.keys(&ctx, "employment:*").await?);

    // 6. Same caller, programmed backend
    println!("6. Same caller against a MockCache with an injected failure:");
    let mock = MockCache::new();
    mock.on(Method::Get, args![Matcher::any(), "employment:emp_001"])
        .return_err(Error::backend("connection reset"))
        .once();

    match load_employment(&mock, &ctx, "emp_001").await {
        Err(e) => println!("   ✓ Failure surfaced to caller: {}\n", e),
        Ok(_) => println!("   ✗ Expected a failure\n"),
    }
    if let Err(unmet) = mock.assert_expectations() {
        println!("   ✗ {}", unmet);
    }

    cache.close().await?;
    println!("=== Example Complete ===\n");

    Ok(())
}
