//! Test utilities & fixtures shared by the integration tests.

use commandbooks::book::ItemStack;
use commandbooks::host::LocalHost;
use commandbooks::permissions::PermissionPolicy;
use commandbooks::service::CommandBooks;
use commandbooks::store::BookStore;

pub const ALICE: &str = "9b1c2f3a-alice";
pub const BOB: &str = "4e5d6c7b-bob";

/// Service over a fresh store in a temp dir. Keep the `TempDir` alive for the test.
pub async fn service() -> (tempfile::TempDir, CommandBooks) {
    let tmp = tempfile::tempdir().expect("tempdir");
    let store = BookStore::new(tmp.path()).await.expect("store");
    (tmp, CommandBooks::new(store, 10))
}

/// Host with Alice and Bob on the default grants.
pub fn host() -> LocalHost {
    let mut host = LocalHost::new(PermissionPolicy::with_defaults());
    host.add_player(ALICE, "Alice");
    host.add_player(BOB, "Bob");
    host
}

pub fn book(pages: &[&str]) -> ItemStack {
    let mut item = ItemStack::writable_book();
    for page in pages {
        item.push_page(*page);
    }
    item
}

/// Drain a player's feedback as display strings.
#[allow(dead_code)]
pub fn messages(host: &mut LocalHost, id: &str) -> Vec<String> {
    host.take_messages(id)
        .into_iter()
        .map(|m| m.to_string())
        .collect()
}
