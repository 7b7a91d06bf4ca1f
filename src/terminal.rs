/*
 Ocivm
 Copyright 2024-2026 Peter Pearson.
 Licensed under the Apache License, Version 2.0 (the "License");
 You may not use this file except in compliance with the License.
 You may obtain a copy of the License at
 http://www.apache.org/licenses/LICENSE-2.0
 Unless required by applicable law or agreed to in writing, software
 distributed under the License is distributed on an "AS IS" BASIS,
 WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 See the License for the specific language governing permissions and
 limitations under the License.
 ---------
*/

use std::io;
use std::io::Write;

pub const BOLD: &str = "\x1b[1m";

pub const RED: &str = "\x1b[31m";
pub const CYAN: &str = "\x1b[36m";
pub const BRIGHT_RED: &str = "\x1b[91m";
pub const BRIGHT_GREEN: &str = "\x1b[92m";
pub const BRIGHT_YELLOW: &str = "\x1b[93m";

pub const RESET: &str = "\x1b[0m";

// move the cursor up one line / erase to the end of the line - used to
// re-ask menu prompts in place after invalid input...
const CURSOR_UP: &str = "\x1b[F";
const ERASE_LINE: &str = "\x1b[K";

pub fn paint(text: &str, codes: &[&str]) -> String {
    if codes.is_empty() {
        return text.to_string();
    }

    format!("{}{}{}", codes.concat(), text, RESET)
}

pub fn error_prefix() -> String {
    paint("Error:", &[BOLD, BRIGHT_RED])
}

pub fn print_error(message: &str) {
    eprintln!("{} {}", error_prefix(), paint(message, &[RED]));
}

// "s" suffix for counts != 1, so "1 subnet" but "3 subnets"...
pub fn plural(count: usize) -> &'static str {
    if count == 1 {
        ""
    } else {
        "s"
    }
}

// prints the prompt, switches the echo colour for what the user types,
// and hands back the trimmed line...
pub fn prompt_line(prompt: &str, echo_colour: &str) -> io::Result<String> {
    print!("{}{}", prompt, echo_colour);
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin().read_line(&mut line)?;

    print!("{}", RESET);
    io::stdout().flush()?;

    Ok(line.trim().to_string())
}

// numbered-menu selection: keeps re-asking (redrawing over the previous
// prompt line) until a valid 1-based index is entered, and returns it
// 0-based...
pub fn prompt_menu_index(prompt: &str, count: usize) -> io::Result<usize> {
    let mut answer = prompt_line(&format!("{}{}", prompt, CYAN), "")?;

    loop {
        if let Ok(index) = answer.parse::<usize>() {
            if index >= 1 && index <= count {
                return Ok(index - 1);
            }
        }

        answer = prompt_line(&format!("{}{}{}{}", CURSOR_UP, prompt, ERASE_LINE, CYAN), "")?;
    }
}
