/*! Integration tests for relaydeck.
 *
 * This test suite is organized as a single integration test binary
 * following the pattern described by matklad in
 * https://matklad.github.io/2021/02/27/delete-cargo-integration-tests.html
 *
 * - resolution: The settings service wired to the in-memory relay pool
 * - accounts: The account store on disk and across restarts
 * - publishing: Edited settings travelling to the relays and back
 */

use tracing_subscriber::EnvFilter;

#[ctor::ctor]
fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("relaydeck=info".parse().unwrap()),
        )
        .with_test_writer()
        .try_init();
}

mod accounts;
mod helpers;
mod publishing;
mod resolution;
