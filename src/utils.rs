use std::{fs, io};
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::time::{Duration, Instant};

/// Reads a labels file: one class name per line, blank lines skipped.
pub(crate) fn file_to_vec<P: AsRef<Path>>(filename: P) -> io::Result<Vec<String>> {
    let file_in = fs::File::open(filename)?;
    let file_reader = BufReader::new(file_in);
    file_reader
        .lines()
        .map(|line| line.map(|l| l.trim().to_string()))
        .filter(|line| !matches!(line, Ok(l) if l.is_empty()))
        .collect()
}

/// Logs the time spent in `l_step` since the previous mark and returns the new mark.
pub(crate) fn trace(l_type: &str, l_step: &str, start: Instant, last_mark: Duration) -> Duration {
    let elapsed = start.elapsed();
    log::trace!("{} | Total={:.2?} | {}={:.2?}", l_type, elapsed, l_step, elapsed - last_mark);
    elapsed
}

pub(crate) fn human_bytes(size: f64) -> String {
    let units = ["", "K", "M", "G", "T"];
    let mut size = size;
    let mut unit = 0;
    while size >= 1000.0 && unit < units.len() - 1 {
        size /= 1000.0;
        unit += 1;
    }
    format!("{:.1}{}", size, units[unit])
}
