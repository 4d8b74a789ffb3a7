use std::path::PathBuf;

/// What happens once a file action is done
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum After {
    PlayNext,
    /// Leave the prompt; the flags say which exit hooks still run
    Quit { save: bool, move_current: bool },
}

impl After {
    // q-suffixed commands: keep saving, don't move the current file again
    const QUIT: After = After::Quit {
        save: true,
        move_current: false,
    };
    // x-suffixed commands: neither
    const EXIT: After = After::Quit {
        save: false,
        move_current: false,
    };
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    /// `-M` dir, or the configured move dir
    Default,
    Dir(PathBuf),
    Keep,
    Reject,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    List,
    Search(String),
    ToggleSound,
    Quit { save: bool, move_current: bool },
    Delete(After),
    Replay,
    Shuffle,
    Save { path: Option<PathBuf>, then_quit: bool },
    PlayerOptions,
    Move { dest: Destination, after: After },
    Next,
    Sort,
    Details,
    Jump { index: i64, play: bool },
    Empty,
    Unknown(String),
}

impl Command {
    pub fn parse(line: &str) -> Command {
        let line = line.trim();
        if line.is_empty() {
            return Command::Empty;
        }

        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };
        let arg = (!rest.is_empty()).then(|| rest.to_string());
        let dir = |arg: Option<String>| arg.map_or(Destination::Default, |d| Destination::Dir(PathBuf::from(d)));

        match word {
            "l" => Command::List,
            "search" => Command::Search(rest.to_string()),
            "nosound" => Command::ToggleSound,
            "q" => Command::Quit {
                save: true,
                move_current: true,
            },
            "x" => Command::Quit {
                save: false,
                move_current: true,
            },
            "y" | "a" => Command::Delete(After::PlayNext),
            "yq" => Command::Delete(After::QUIT),
            "yx" => Command::Delete(After::Quit {
                save: false,
                move_current: true,
            }),
            "r" => Command::Replay,
            "z" => Command::Shuffle,
            "s" => Command::Save {
                path: arg.map(PathBuf::from),
                then_quit: false,
            },
            "sq" => Command::Save {
                path: arg.map(PathBuf::from),
                then_quit: true,
            },
            "p" => Command::PlayerOptions,
            "g" => Command::Move {
                dest: Destination::Keep,
                after: After::PlayNext,
            },
            "gq" => Command::Move {
                dest: Destination::Keep,
                after: After::QUIT,
            },
            "gx" => Command::Move {
                dest: Destination::Keep,
                after: After::EXIT,
            },
            "ng" => Command::Move {
                dest: Destination::Reject,
                after: After::PlayNext,
            },
            "ngq" => Command::Move {
                dest: Destination::Reject,
                after: After::QUIT,
            },
            "ngx" => Command::Move {
                dest: Destination::Reject,
                after: After::EXIT,
            },
            "m" => Command::Move {
                dest: dir(arg),
                after: After::PlayNext,
            },
            "mq" => Command::Move {
                dest: dir(arg),
                after: After::QUIT,
            },
            "nm" => Command::Next,
            "nmq" => Command::Quit {
                save: true,
                move_current: false,
            },
            "nmx" => Command::Quit {
                save: false,
                move_current: false,
            },
            "sort" => Command::Sort,
            "details" => Command::Details,
            _ => match parse_index(word) {
                Some(index) => Command::Jump {
                    index,
                    play: rest.starts_with('p'),
                },
                None => Command::Unknown(line.to_string()),
            },
        }
    }
}

fn parse_index(word: &str) -> Option<i64> {
    let digits = word.trim_start_matches(|c: char| c == '+' || c == '-');
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    word.trim_start_matches('+').parse().ok()
}
