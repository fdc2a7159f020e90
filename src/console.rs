//! Line-driven front end for the controller.
//!
//! User input and request completions arrive as `Event`s on one channel and
//! are handled one at a time on the control thread. Requests are sent by a
//! `Dispatcher`, which posts the completion back tagged with its sequence
//! number.

use std::io::Write;
use std::path::PathBuf;
use std::sync::mpsc::Sender;

use anyhow::{anyhow, Context, Result};

use crate::controller::{Applied, DetectionTicket, UiState, UiStateController};
use crate::detect::{DetectionRequestClient, DetectionResult};
use crate::ui::print_view;

pub const HELP: &str = "\
commands:
  upload <path>      send an image file for detection
  camera             open the rear camera preview
  snap               capture a photo from the open camera
  cancel             close the camera without capturing
  threshold <0-100>  set the confidence threshold (reprocesses the held image)
  save <path>        write the annotated image (extension added if missing)
  reset              drop the held image and start over
  show               print the current view
  help               show this help
  quit               exit";

#[derive(Debug)]
pub enum Event {
    Input(String),
    /// No more input will arrive (stdin EOF). Exits once nothing is in flight.
    InputClosed,
    Completed { seq: u64, result: DetectionResult },
    /// Exit now (Ctrl-C).
    Shutdown,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Upload(PathBuf),
    Camera,
    Snap,
    Cancel,
    Threshold(u32),
    Save(PathBuf),
    Reset,
    Show,
    Help,
    Quit,
}

/// Parse one input line. Blank lines yield `None`.
pub fn parse_command(line: &str) -> Result<Option<Command>> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };
    let command = match word.to_lowercase().as_str() {
        "upload" | "u" => Command::Upload(required_path(rest, "upload")?),
        "camera" | "c" => Command::Camera,
        "snap" | "s" => Command::Snap,
        "cancel" => Command::Cancel,
        "threshold" | "t" => {
            let position = rest
                .parse::<u32>()
                .map_err(|_| anyhow!("threshold expects an integer 0-100"))?;
            Command::Threshold(position)
        }
        "save" => Command::Save(required_path(rest, "save")?),
        "reset" | "clear" => Command::Reset,
        "show" => Command::Show,
        "help" | "?" => Command::Help,
        "quit" | "exit" | "q" => Command::Quit,
        other => return Err(anyhow!("unknown command '{}'; type `help`", other)),
    };
    Ok(Some(command))
}

fn required_path(rest: &str, command: &str) -> Result<PathBuf> {
    if rest.is_empty() {
        return Err(anyhow!("{} expects a file path", command));
    }
    Ok(PathBuf::from(rest))
}

/// Sends issued requests somewhere and eventually reports completions.
pub trait Dispatcher {
    fn dispatch(&mut self, ticket: DetectionTicket);
}

/// Runs each request on its own worker thread and posts the completion to
/// the event channel.
pub struct ThreadDispatcher {
    client: DetectionRequestClient,
    events: Sender<Event>,
}

impl ThreadDispatcher {
    pub fn new(client: DetectionRequestClient, events: Sender<Event>) -> Self {
        Self { client, events }
    }
}

impl Dispatcher for ThreadDispatcher {
    fn dispatch(&mut self, ticket: DetectionTicket) {
        let client = self.client.clone();
        let events = self.events.clone();
        std::thread::spawn(move || {
            let result = ticket.send(&client);
            // The receiver is gone once the console exits.
            let _ = events.send(Event::Completed {
                seq: ticket.seq,
                result,
            });
        });
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

pub struct Console<D: Dispatcher, W: Write> {
    controller: UiStateController,
    dispatcher: D,
    out: W,
    input_closed: bool,
}

impl<D: Dispatcher, W: Write> Console<D, W> {
    pub fn new(controller: UiStateController, dispatcher: D, out: W) -> Self {
        Self {
            controller,
            dispatcher,
            out,
            input_closed: false,
        }
    }

    pub fn controller(&self) -> &UiStateController {
        &self.controller
    }

    /// Shut down and hand back the output sink.
    pub fn into_output(mut self) -> W {
        self.controller.shutdown();
        self.out
    }

    pub fn handle(&mut self, event: Event) -> Result<Flow> {
        match event {
            Event::Input(line) => match parse_command(&line) {
                Ok(Some(command)) => self.run_command(command),
                Ok(None) => Ok(Flow::Continue),
                Err(err) => {
                    writeln!(self.out, "! {}", err)?;
                    Ok(Flow::Continue)
                }
            },
            Event::InputClosed => {
                self.input_closed = true;
                Ok(self.exit_when_idle())
            }
            Event::Completed { seq, result } => {
                if self.controller.apply(seq, result) == Applied::Current {
                    self.render()?;
                }
                Ok(self.exit_when_idle())
            }
            Event::Shutdown => {
                self.shutdown();
                Ok(Flow::Exit)
            }
        }
    }

    /// After input closes, keep running until the latest request completes.
    fn exit_when_idle(&mut self) -> Flow {
        if self.input_closed && !self.controller.state().is_loading() {
            self.shutdown();
            Flow::Exit
        } else {
            Flow::Continue
        }
    }

    /// Release the camera before exit.
    pub fn shutdown(&mut self) {
        self.controller.shutdown();
    }

    fn run_command(&mut self, command: Command) -> Result<Flow> {
        match command {
            Command::Upload(path) => {
                if let Ok(ticket) = self.controller.upload(&path) {
                    self.dispatcher.dispatch(ticket);
                }
            }
            Command::Camera => {
                // Failure is surfaced through the view notice.
                let _ = self.controller.open_camera();
            }
            Command::Snap => {
                if let Ok(ticket) = self.controller.capture_photo() {
                    self.dispatcher.dispatch(ticket);
                }
            }
            Command::Cancel => self.controller.cancel_camera(),
            Command::Threshold(position) => {
                if let Some(ticket) = self.controller.set_threshold_slider(position) {
                    self.dispatcher.dispatch(ticket);
                }
            }
            Command::Save(path) => {
                self.save(path)?;
                return Ok(Flow::Continue);
            }
            Command::Reset => self.controller.reset(),
            Command::Show => {}
            Command::Help => {
                writeln!(self.out, "{}", HELP)?;
                return Ok(Flow::Continue);
            }
            Command::Quit => {
                self.shutdown();
                return Ok(Flow::Exit);
            }
        }
        self.render()?;
        Ok(Flow::Continue)
    }

    fn save(&mut self, path: PathBuf) -> Result<()> {
        match self.controller.state() {
            UiState::Result {
                annotated_image, ..
            } => {
                let path = if path.extension().is_none() {
                    path.with_extension(annotated_image.extension())
                } else {
                    path
                };
                annotated_image
                    .write_to(&path)
                    .with_context(|| format!("write annotated image to {}", path.display()))?;
                writeln!(self.out, "saved annotated image to {}", path.display())?;
            }
            _ => writeln!(self.out, "! no annotated image to save")?,
        }
        Ok(())
    }

    fn render(&mut self) -> Result<()> {
        let view = self.controller.view();
        print_view(&mut self.out, &view)?;
        self.out.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_commands_and_aliases() {
        assert_eq!(
            parse_command("upload  photos/apple.jpg ").unwrap(),
            Some(Command::Upload(PathBuf::from("photos/apple.jpg")))
        );
        assert_eq!(parse_command("t 80").unwrap(), Some(Command::Threshold(80)));
        assert_eq!(parse_command("CAMERA").unwrap(), Some(Command::Camera));
        assert_eq!(parse_command("snap").unwrap(), Some(Command::Snap));
        assert_eq!(parse_command("q").unwrap(), Some(Command::Quit));
        assert_eq!(parse_command("clear").unwrap(), Some(Command::Reset));
        assert_eq!(parse_command("   ").unwrap(), None);
    }

    #[test]
    fn rejects_bad_input() {
        assert!(parse_command("threshold eighty").is_err());
        assert!(parse_command("threshold -5").is_err());
        assert!(parse_command("upload").is_err());
        assert!(parse_command("dance").is_err());
    }
}
