use std::time::Duration;

use commandbooks::config::Config;
use commandbooks::console::{Console, Flow};

async fn console(dir: &std::path::Path) -> Console {
    let mut config = Config::default();
    config.storage.data_dir = dir.to_string_lossy().to_string();
    config.trigger.tick_ms = 5;
    config.logging.file = None;
    Console::new(&config, "Steve").await.unwrap()
}

async fn say(console: &mut Console, line: &str) -> Vec<String> {
    let (flow, out) = console.handle_line(line).await.unwrap();
    assert_eq!(flow, Flow::Continue);
    out
}

#[tokio::test]
async fn write_save_load_and_list() {
    let tmp = tempfile::tempdir().unwrap();
    let mut console = console(tmp.path()).await;
    assert_eq!(console.actor(), "steve");

    assert_eq!(say(&mut console, "book").await, vec!["You take a book and quill."]);
    assert_eq!(say(&mut console, "write time set day").await, vec!["Page 1 written."]);
    assert_eq!(say(&mut console, "write weather\\nclear").await, vec!["Page 2 written."]);
    assert_eq!(say(&mut console, "cmd save Morning").await, vec!["Saved CommandBook Morning"]);
    assert_eq!(
        say(&mut console, "/cmd list").await,
        vec!["Steve's CommandBooks", " - morning"]
    );
    assert_eq!(say(&mut console, "cmd load morning").await, vec!["Loaded CommandBook morning"]);

    // the loaded book went to the inventory because the hand was full
    let inv = say(&mut console, "inv").await;
    assert_eq!(inv, vec!["Hand: Book and Quill", " 1. morning"]);
    assert_eq!(say(&mut console, "hold 1").await, vec!["Now holding slot 1."]);
    assert_eq!(
        say(&mut console, "pages").await,
        vec!["morning:", "  1. time set day", "  2. weather clear"]
    );
}

#[tokio::test]
async fn using_a_book_releases_its_commands() {
    let tmp = tempfile::tempdir().unwrap();
    let mut console = console(tmp.path()).await;
    say(&mut console, "book").await;
    say(&mut console, "write say hello").await;
    say(&mut console, "write cmd save echo").await;

    assert_eq!(say(&mut console, "use").await, vec!["Processing commands..."]);

    let mut out = Vec::new();
    for _ in 0..2 {
        let task = tokio::time::timeout(Duration::from_secs(5), console.next_released())
            .await
            .unwrap()
            .unwrap();
        out.extend(console.run_released(task).await.unwrap());
    }
    assert_eq!(out, vec!["[steve] > say hello", "Saved CommandBook echo"]);
}

#[tokio::test]
async fn using_nothing_does_nothing() {
    let tmp = tempfile::tempdir().unwrap();
    let mut console = console(tmp.path()).await;
    assert_eq!(say(&mut console, "use").await, vec!["Nothing happens."]);
    say(&mut console, "book").await;
    assert_eq!(say(&mut console, "use").await, vec!["Nothing happens."]);
}

#[tokio::test]
async fn acting_as_another_player() {
    let tmp = tempfile::tempdir().unwrap();
    let mut console = console(tmp.path()).await;
    say(&mut console, "book").await;
    say(&mut console, "write give @p bread").await;
    say(&mut console, "cmd save kit").await;

    assert_eq!(say(&mut console, "as Alex").await, vec!["Now acting as Alex."]);
    assert_eq!(console.actor(), "alex");
    assert_eq!(
        say(&mut console, "cmd load steve kit").await,
        vec!["! You do not have permission to use this command"]
    );
    console
        .host_mut()
        .policy_mut()
        .grant("alex", "commandbook.command.load.other");
    assert_eq!(say(&mut console, "cmd load steve kit").await, vec!["Loaded CommandBook kit"]);
    let alex = console.host().player("alex").unwrap();
    assert_eq!(
        alex.main_hand.as_ref().and_then(|b| b.pages.clone()),
        Some(vec!["give @p bread".to_string()])
    );
}

#[tokio::test]
async fn malformed_input_is_reported() {
    let tmp = tempfile::tempdir().unwrap();
    let mut console = console(tmp.path()).await;
    assert_eq!(say(&mut console, "cmd save").await, vec!["! Usage: cmd save <name>"]);
    assert_eq!(
        say(&mut console, "cmd frobnicate").await,
        vec!["! Unknown subcommand 'frobnicate'. Try: cmd help"]
    );
    assert_eq!(say(&mut console, "dance").await, vec!["! Unknown input 'dance'. Type help."]);
    assert_eq!(say(&mut console, "hold 3").await, vec!["! No such inventory slot"]);
    let (flow, _) = console.handle_line("quit").await.unwrap();
    assert_eq!(flow, Flow::Quit);
}
