mod common;

use commandbooks::book::ItemKind;
use commandbooks::commands::BookCommand;
use commandbooks::host::{Hand, Inventory};
use common::{book, host, messages, service, ALICE, BOB};

#[tokio::test]
async fn save_then_load_gives_an_equivalent_book() {
    let (_tmp, books) = service().await;
    let mut host = host();
    host.set_main_hand(ALICE, book(&["time set day", "weather\nclear"]));

    books.save(&mut host, ALICE, "Morning").await.unwrap();
    assert_eq!(messages(&mut host, ALICE), vec!["Saved CommandBook Morning"]);

    // drop the original so the loaded copy lands in the hand
    host.player_mut(ALICE).unwrap().main_hand = None;
    books.load(&mut host, ALICE, None, "MORNING").await.unwrap();
    assert_eq!(messages(&mut host, ALICE), vec!["Loaded CommandBook MORNING"]);

    let loaded = host.held_item(ALICE, Hand::Main).unwrap();
    assert_eq!(loaded.kind, ItemKind::WritableBook);
    assert_eq!(loaded.display_name.as_deref(), Some("MORNING"));
    assert_eq!(
        loaded.pages,
        Some(vec!["time set day".to_string(), "weather clear".to_string()])
    );
}

#[tokio::test]
async fn load_unknown_name_reports_and_gives_nothing() {
    let (_tmp, books) = service().await;
    let mut host = host();
    books.load(&mut host, ALICE, None, "ghost").await.unwrap();
    assert_eq!(
        messages(&mut host, ALICE),
        vec!["! A book by that name does not exist"]
    );
    let alice = host.player(ALICE).unwrap();
    assert!(alice.main_hand.is_none());
    assert!(alice.inventory.is_empty());
}

#[tokio::test]
async fn load_of_an_empty_saved_book_gives_an_empty_book() {
    let (_tmp, books) = service().await;
    let mut host = host();
    host.set_main_hand(ALICE, commandbooks::book::ItemStack::build_book("blank", vec![]));
    books.save(&mut host, ALICE, "blank").await.unwrap();
    host.player_mut(ALICE).unwrap().main_hand = None;

    books.load(&mut host, ALICE, None, "blank").await.unwrap();
    assert_eq!(
        messages(&mut host, ALICE).last().map(String::as_str),
        Some("Loaded CommandBook blank")
    );
    let loaded = host.held_item(ALICE, Hand::Main).unwrap();
    assert_eq!(loaded.pages, Some(Vec::new()));
}

#[tokio::test]
async fn save_without_a_book_changes_nothing() {
    let (_tmp, books) = service().await;
    let mut host = host();
    books.save(&mut host, ALICE, "kit").await.unwrap();
    assert_eq!(messages(&mut host, ALICE), vec!["! You are not holding a book"]);
    assert!(books.store().list(ALICE).await.unwrap().is_empty());
    assert!(!books.store().user_path(ALICE).exists());
}

#[tokio::test]
async fn save_rejects_a_signed_book() {
    let (_tmp, books) = service().await;
    let mut host = host();
    let mut signed = commandbooks::book::ItemStack::new(ItemKind::WrittenBook);
    signed.push_page("say hi");
    host.set_main_hand(ALICE, signed);
    books.save(&mut host, ALICE, "kit").await.unwrap();
    assert_eq!(messages(&mut host, ALICE), vec!["! You are not holding a book"]);
}

#[tokio::test]
async fn list_is_sorted_and_titled_with_the_owner() {
    let (_tmp, books) = service().await;
    let mut host = host();
    host.set_main_hand(ALICE, book(&["say hi"]));
    for name in ["b", "a", "c"] {
        books.save(&mut host, ALICE, name).await.unwrap();
    }
    messages(&mut host, ALICE);

    books.list(&mut host, ALICE, None, 1).await.unwrap();
    assert_eq!(
        messages(&mut host, ALICE),
        vec!["Alice's CommandBooks", " - a", " - b", " - c"]
    );
}

#[tokio::test]
async fn list_pages_after_ten_entries() {
    let (_tmp, books) = service().await;
    let mut host = host();
    host.policy_mut().grant(ALICE, "commandbook.command.list.other");
    host.set_main_hand(BOB, book(&["say hi"]));
    for i in 0..12 {
        books.save(&mut host, BOB, &format!("book{:02}", i)).await.unwrap();
    }

    books.list(&mut host, ALICE, Some("Bob"), 2).await.unwrap();
    assert_eq!(
        messages(&mut host, ALICE),
        vec!["Bob's CommandBooks", " - book10", " - book11", "Page 2/2"]
    );
}

#[tokio::test]
async fn load_from_another_user_lands_with_the_caller() {
    let (_tmp, books) = service().await;
    let mut host = host();
    host.policy_mut().grant(ALICE, "commandbook.command.load.other");
    host.set_main_hand(BOB, book(&["give @p bread"]));
    books.save(&mut host, BOB, "kit").await.unwrap();
    messages(&mut host, BOB);

    books.load(&mut host, ALICE, Some("bob"), "kit").await.unwrap();
    assert_eq!(messages(&mut host, ALICE), vec!["Loaded CommandBook kit"]);
    let loaded = host.held_item(ALICE, Hand::Main).unwrap();
    assert_eq!(loaded.pages, Some(vec!["give @p bread".to_string()]));
    // Bob keeps only his original book
    assert!(host.player(BOB).unwrap().inventory.is_empty());
    assert!(messages(&mut host, BOB).is_empty());
}

#[tokio::test]
async fn unknown_target_user_is_reported() {
    let (_tmp, books) = service().await;
    let mut host = host();
    host.policy_mut().grant(ALICE, "commandbook.*");
    books.load(&mut host, ALICE, Some("herobrine"), "kit").await.unwrap();
    books.list(&mut host, ALICE, Some("herobrine"), 1).await.unwrap();
    assert_eq!(
        messages(&mut host, ALICE),
        vec!["! Unknown user herobrine", "! Unknown user herobrine"]
    );
}

#[tokio::test]
async fn copy_produces_an_independent_duplicate() {
    let (_tmp, books) = service().await;
    let mut host = host();
    host.set_main_hand(ALICE, book(&["say one"]));
    books.copy(&mut host, ALICE);
    assert_eq!(messages(&mut host, ALICE), vec!["Copied CommandBook"]);

    let original = host.held_item(ALICE, Hand::Main).unwrap();
    let copy = host.player(ALICE).unwrap().inventory[0].clone();
    assert_eq!(copy.pages, original.pages);
    assert_ne!(copy.id, original.id);

    host.player_mut(ALICE).unwrap().inventory[0].push_page("say two");
    assert_eq!(
        host.held_item(ALICE, Hand::Main).unwrap().pages,
        Some(vec!["say one".to_string()])
    );
    assert!(books.store().list(ALICE).await.unwrap().is_empty());
}

#[tokio::test]
async fn copy_without_a_book_is_refused() {
    let (_tmp, books) = service().await;
    let mut host = host();
    books.copy(&mut host, ALICE);
    assert_eq!(
        messages(&mut host, ALICE),
        vec!["! You must be holding a book to use this command"]
    );
    assert!(host.player(ALICE).unwrap().inventory.is_empty());
}

#[tokio::test]
async fn invalid_book_names_are_reported() {
    let (_tmp, books) = service().await;
    let mut host = host();
    host.set_main_hand(ALICE, book(&["say hi"]));
    let long = "x".repeat(65);
    books.save(&mut host, ALICE, &long).await.unwrap();
    assert_eq!(
        messages(&mut host, ALICE),
        vec!["! Book name is too long (maximum 64 characters)"]
    );
    assert!(books.store().list(ALICE).await.unwrap().is_empty());
}

#[tokio::test]
async fn execute_routes_parsed_commands() {
    let (_tmp, books) = service().await;
    let mut host = host();
    host.set_main_hand(ALICE, book(&["say hi"]));
    for line in ["cmd save kit", "cmd list", "cmd help"] {
        let command = BookCommand::parse(line).unwrap();
        books.execute(&mut host, ALICE, command).await.unwrap();
    }
    let out = messages(&mut host, ALICE);
    assert_eq!(out[0], "Saved CommandBook kit");
    assert_eq!(&out[1..3], &["Alice's CommandBooks", " - kit"]);
    assert_eq!(out[3], "CommandBooks commands:");
    // default grants hide the .other commands from help
    assert!(out.iter().any(|l| l.contains("cmd save <name>")));
    assert!(!out.iter().any(|l| l.contains("cmd load <user> <name>")));
    assert!(out.iter().any(|l| l.contains("cmd help")));
}

#[tokio::test]
async fn storage_failures_surface_as_errors() {
    let (_tmp, books) = service().await;
    let mut host = host();
    std::fs::write(books.store().user_path(ALICE), "kit = [unterminated").unwrap();
    let err = books.list(&mut host, ALICE, None, 1).await.unwrap_err();
    assert!(format!("{:#}", err).contains("listing books of"));
}
