//
//  Copyright (C) 2022-2024  Chase Ruskin
//
//  This program is free software: you can redistribute it and/or modify
//  it under the terms of the GNU General Public License as published by
//  the Free Software Foundation, either version 3 of the License, or
//  (at your option) any later version.
//
//  This program is distributed in the hope that it will be useful,
//  but WITHOUT ANY WARRANTY; without even the implied warranty of
//  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
//  GNU General Public License for more details.
//
//  You should have received a copy of the GNU General Public License
//  along with this program.  If not, see <http://www.gnu.org/licenses/>.
//

//! A console backend for the `log` facade.

use colored::{ColoredString, Colorize};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError};

struct Console;

static CONSOLE: Console = Console;

fn label(level: Level) -> ColoredString {
    match level {
        Level::Error => "error".red().bold(),
        Level::Warn => "warning".yellow(),
        Level::Info => "info".green(),
        Level::Debug => "debug".blue(),
        Level::Trace => "trace".normal(),
    }
}

/// Formats a record the way it is printed, as `<level>: <message>`.
pub fn format(level: Level, args: &std::fmt::Arguments) -> String {
    format!("{}: {}", label(level), args)
}

impl Log for Console {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) == true {
            eprintln!("{}", format(record.level(), record.args()));
        }
    }

    fn flush(&self) {}
}

/// Installs the console logger, showing records up to `level`.
///
/// Fails if a logger was already installed for this process.
pub fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
    log::set_logger(&CONSOLE)?;
    log::set_max_level(level);
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn record_format() {
        colored::control::set_override(false);
        assert_eq!(format(Level::Warn, &format_args!("skipping {}", "a.core")), "warning: skipping a.core");
        assert_eq!(format(Level::Error, &format_args!("boom")), "error: boom");
        colored::control::unset_override();
    }

    #[test]
    fn init_only_once() {
        let first = init(LevelFilter::Warn);
        // a second install always fails regardless of which test installed first
        assert_eq!(init(LevelFilter::Debug).is_err(), true);
        if first.is_ok() {
            assert_eq!(log::max_level(), LevelFilter::Warn);
        }
    }
}
