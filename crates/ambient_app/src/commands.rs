//! Console command parsing

use ambient_engine::settings::{Choice, Season, TimeOfDay, Weather};

/// One line of console input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Toggle a sound
    Toggle(String),
    /// Set a sound's volume
    Volume(String, i32),
    /// Reset one sound
    Reset(String),
    /// Reset every sound
    ResetAll,
    /// Pause or resume everything
    Pause,
    /// Draw a random mix
    Random,
    /// Toggle dynamic mode
    Dynamic,
    /// Print the mixer state
    Status,
    /// Stage a time of day
    Time(TimeOfDay),
    /// Stage a season
    Season(Season),
    /// Stage a weather
    Weather(Weather),
    /// Commit staged settings
    Save,
    /// Print the command list
    Help,
    /// Leave the console
    Quit,
}

/// Why a line could not be parsed
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// Blank line
    #[error("empty command")]
    Empty,
    /// First word is not a command
    #[error("unknown command '{0}', try 'help'")]
    Unknown(String),
    /// Required argument missing
    #[error("'{command}' needs {what}")]
    MissingArgument {
        /// Command name
        command: &'static str,
        /// Description of the argument
        what: &'static str,
    },
    /// Argument present but unusable
    #[error("invalid {what}: '{value}'")]
    InvalidArgument {
        /// Description of the argument
        what: &'static str,
        /// Offending text
        value: String,
    },
}

/// Help text printed by `help`
pub const HELP: &str = "\
toggle <id>        turn a sound on (or off with the flip policy)
vol <id> <0-100>   set a sound's volume
reset <id>         silence one sound
reset-all          silence everything
pause              pause or resume everything
random             draw a random mix
dynamic            toggle dynamic mode
status             show the mix
time|season|weather <label>   stage a scene setting
save               commit staged settings
quit               exit";

impl std::str::FromStr for Command {
    type Err = ParseError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let Some(name) = words.next() else {
            return Err(ParseError::Empty);
        };
        let mut arg = |command: &'static str, what: &'static str| {
            words
                .next()
                .map(str::to_owned)
                .ok_or(ParseError::MissingArgument { command, what })
        };

        match name {
            "toggle" | "t" => Ok(Self::Toggle(arg("toggle", "a sound id")?)),
            "vol" | "v" => {
                let id = arg("vol", "a sound id")?;
                let raw = arg("vol", "a volume")?;
                let volume = raw.parse().map_err(|_| ParseError::InvalidArgument {
                    what: "volume",
                    value: raw,
                })?;
                Ok(Self::Volume(id, volume))
            }
            "reset" => Ok(Self::Reset(arg("reset", "a sound id")?)),
            "reset-all" => Ok(Self::ResetAll),
            "pause" | "p" => Ok(Self::Pause),
            "random" | "r" => Ok(Self::Random),
            "dynamic" | "d" => Ok(Self::Dynamic),
            "status" | "s" => Ok(Self::Status),
            "time" => Ok(Self::Time(choice(&arg("time", "a time of day")?, "time of day")?)),
            "season" => Ok(Self::Season(choice(&arg("season", "a season")?, "season")?)),
            "weather" => Ok(Self::Weather(choice(&arg("weather", "a weather")?, "weather")?)),
            "save" => Ok(Self::Save),
            "help" | "?" => Ok(Self::Help),
            "quit" | "exit" | "q" => Ok(Self::Quit),
            other => Err(ParseError::Unknown(other.to_string())),
        }
    }
}

fn choice<C: Choice>(label: &str, what: &'static str) -> Result<C, ParseError> {
    C::from_label(label).ok_or_else(|| ParseError::InvalidArgument {
        what,
        value: label.to_string(),
    })
}
