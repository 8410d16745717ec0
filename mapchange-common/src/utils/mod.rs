/*
This code is part of the MapChange geospatial editing tools.
Authors: MapChange contributors
Created: 03/09/2026
Last Modified: 27/09/2026
License: MIT
*/

use std::path;
use std::time::Instant;

/// Returns a formatted string of elapsed time, e.g.
/// `1min 34.852s`
pub fn get_formatted_elapsed_time(instant: Instant) -> String {
    let dur = instant.elapsed();
    let minutes = dur.as_secs() / 60;
    let sub_sec = dur.as_secs() % 60;
    let sub_milli = dur.subsec_millis();
    if minutes > 0 {
        return format!("{}min {}.{:03}s", minutes, sub_sec, sub_milli);
    }
    format!("{}.{:03}s", sub_sec, sub_milli)
}

/// Prefixes a bare file name with the working directory. Names that already
/// contain a path separator are returned unchanged.
pub fn resolve_path(working_directory: &str, file_name: &str) -> String {
    if file_name.is_empty()
        || file_name.contains(path::MAIN_SEPARATOR)
        || file_name.contains('/')
    {
        return file_name.to_string();
    }
    if working_directory.is_empty() {
        return file_name.to_string();
    }
    let sep = path::MAIN_SEPARATOR.to_string();
    if working_directory.ends_with(&sep) || working_directory.ends_with('/') {
        format!("{}{}", working_directory, file_name)
    } else {
        format!("{}{}{}", working_directory, sep, file_name)
    }
}

pub fn wrapped_text(val: &str, width: usize) -> String {
    let paragraphs: Vec<&str> = val.split("\n\n").collect();
    let mut ret = String::new();
    for (i, para) in paragraphs.iter().enumerate() {
        let s = para.replace('\n', " ");
        let mut line = String::new();
        for word in s.split_whitespace() {
            if line.is_empty() {
                line.push_str(word);
            } else if line.len() + word.len() + 1 <= width {
                line.push(' ');
                line.push_str(word);
            } else {
                ret.push_str(&line);
                ret.push('\n');
                line = word.to_string();
            }
        }
        ret.push_str(&line);
        if i < paragraphs.len() - 1 {
            ret.push_str("\n\n");
        }
    }
    ret
}

pub fn wrapped_print(val: &str, width: usize) {
    println!("{}", wrapped_text(val, width));
}
