//! Interactive line shell standing in for the two-screen client: a sign-in gate followed by the
//! upload form.

use std::{io::Write, path::PathBuf};

use anyhow::Result;
use client_core::{
    http_transport, load_file, ClientSettings, CredentialGate, NoticeBoard, SubmitOutcome,
    UploadController, UploadTransport,
};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::render;

const HELP: &str = "\
commands:
  login <username> <password>   sign in
  select <path>                 pick a file
  drag | leave                  start or end hovering a drag over the drop zone
  drop <path> [<path>...]       drop files (the first one is taken)
  clear                         remove the selected file
  submit                        upload the selected file
  show                          print status and results
  details <row>                 print the detail view of a result row (1-based)
  notice                        print the live notice, if any
  help | quit";

#[derive(Debug, PartialEq, Eq)]
enum ShellCommand {
    Login { username: String, password: String },
    Select(PathBuf),
    Drag,
    Leave,
    Drop(Vec<PathBuf>),
    Clear,
    Submit,
    Show,
    Details(usize),
    Notice,
    Help,
    Quit,
}

fn parse_command(line: &str) -> Result<Option<ShellCommand>, String> {
    let mut words = line.split_whitespace();
    let Some(command) = words.next() else {
        return Ok(None);
    };
    let args: Vec<&str> = words.collect();

    let parsed = match (command, args.as_slice()) {
        ("login", [username, password]) => ShellCommand::Login {
            username: username.to_string(),
            password: password.to_string(),
        },
        ("select", [path]) => ShellCommand::Select(PathBuf::from(path)),
        ("drag", []) => ShellCommand::Drag,
        ("leave", []) => ShellCommand::Leave,
        ("drop", paths) => ShellCommand::Drop(paths.iter().map(PathBuf::from).collect()),
        ("clear", []) => ShellCommand::Clear,
        ("submit", []) => ShellCommand::Submit,
        ("show", []) => ShellCommand::Show,
        ("details", [row]) => {
            let row = row
                .parse::<usize>()
                .ok()
                .filter(|row| *row > 0)
                .ok_or_else(|| format!("invalid row number '{row}'"))?;
            ShellCommand::Details(row)
        }
        ("notice", []) => ShellCommand::Notice,
        ("help", []) => ShellCommand::Help,
        ("quit" | "exit", []) => ShellCommand::Quit,
        _ => return Err(format!("unrecognized command '{line}'; type 'help'")),
    };
    Ok(Some(parsed))
}

struct ShellSession<T: UploadTransport> {
    gate: CredentialGate,
    controller: UploadController<T>,
    notices: NoticeBoard,
    signed_in: bool,
}

impl<T: UploadTransport> ShellSession<T> {
    /// Returns false once the session should end.
    async fn execute(&mut self, command: ShellCommand) -> bool {
        match command {
            ShellCommand::Quit => return false,
            ShellCommand::Help => println!("{HELP}"),
            ShellCommand::Notice => self.print_notice(),
            ShellCommand::Login { username, password } => {
                if self.gate.attempt(&username, &password) {
                    self.signed_in = true;
                    println!("signed in; upload a health report");
                } else {
                    self.print_notice();
                }
            }
            _ if !self.signed_in => println!("sign in first: login <username> <password>"),
            ShellCommand::Select(path) => match load_file(&path).await {
                Ok(file) => self.report_lifecycle(self.controller.select_file(file)),
                Err(err) => println!("{err:#}"),
            },
            ShellCommand::Drag => self.controller.set_drag_active(true),
            ShellCommand::Leave => self.controller.set_drag_active(false),
            ShellCommand::Drop(paths) => {
                let mut files = Vec::new();
                if let Some(path) = paths.first() {
                    match load_file(path).await {
                        Ok(file) => files.push(file),
                        Err(err) => println!("{err:#}"),
                    }
                }
                self.report_lifecycle(self.controller.drop_files(files));
            }
            ShellCommand::Clear => self.report_lifecycle(self.controller.clear_file()),
            ShellCommand::Submit => {
                match self.controller.submit().await {
                    SubmitOutcome::NothingSelected => println!("select a file first"),
                    SubmitOutcome::AlreadyInFlight => println!("an upload is already running"),
                    SubmitOutcome::Succeeded { .. } | SubmitOutcome::Failed(_) => {
                        self.print_notice();
                        self.print_results();
                    }
                }
            }
            ShellCommand::Show => {
                println!(
                    "{}",
                    render::status_line(&self.controller.state(), self.controller.drag_active())
                );
                self.print_results();
            }
            ShellCommand::Details(row) => {
                let view = self.controller.result_view();
                match row.checked_sub(1).and_then(|idx| view.rows().get(idx)) {
                    Some(row) => println!("{}", row.details()),
                    None => println!("no result row {row}"),
                }
            }
        }
        true
    }

    fn report_lifecycle(&self, result: Result<(), client_core::LifecycleError>) {
        match result {
            Ok(()) => println!(
                "{}",
                render::status_line(&self.controller.state(), self.controller.drag_active())
            ),
            Err(err) => println!("{err}"),
        }
    }

    fn print_notice(&self) {
        if let Some(notice) = self.notices.current() {
            println!("{}", render::notice_line(&notice));
        }
    }

    fn print_results(&self) {
        if let Some(rendered) = render::result_view(&self.controller.result_view()) {
            println!("{rendered}");
        }
    }
}

pub async fn run(settings: &ClientSettings) -> Result<()> {
    let notices = NoticeBoard::new();
    let mut session = ShellSession {
        gate: CredentialGate::new(
            settings.username.clone(),
            settings.password.clone(),
            notices.clone(),
        )
        .with_notice_delay(settings.login_notice_delay),
        controller: UploadController::with_notice_delay(
            http_transport(settings)?,
            notices.clone(),
            settings.upload_notice_delay,
        ),
        notices,
        signed_in: false,
    };

    println!("{HELP}");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush()?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        match parse_command(&line) {
            Ok(Some(command)) => {
                if !session.execute(command).await {
                    break;
                }
            }
            Ok(None) => {}
            Err(message) => println!("{message}"),
        }
    }
    Ok(())
}
