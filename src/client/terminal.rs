//! Line-oriented terminal front end for the shell.

use tokio::io::{AsyncBufReadExt, BufReader};

use super::{AssistantApi, Shell, Tab};

const HELP: &str = "Befehle: /chat, /spiele, /planung, /quit";

/// Run the interactive shell on stdin/stdout until `/quit` or end of input.
pub async fn run(api: impl AssistantApi) -> std::io::Result<()> {
    let mut shell = Shell::new(api);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("{}\n{}", shell.render(), HELP);

    while let Some(line) = lines.next_line().await? {
        match line.trim() {
            "/quit" => break,
            "/chat" => shell.select(Tab::Chat),
            "/spiele" => shell.select(Tab::Games),
            "/planung" => shell.select(Tab::Planning),
            _ => shell.submit(&line).await,
        }
        println!("{}", shell.render());
    }
    Ok(())
}
