use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

/// Let the user pick one file out of `files`, displayed relative to `root`.
///
/// Blocks on stdin. A valid index selects that entry; an empty line or `q`
/// cancels, as does end of input. Returns `None` when cancelled.
pub fn choose(files: &[PathBuf], root: &Path) -> io::Result<Option<PathBuf>> {
    let stdin = io::stdin();
    choose_from(files, root, stdin.lock(), io::stdout())
}

pub fn choose_from<R: BufRead, W: Write>(
    files: &[PathBuf],
    root: &Path,
    mut input: R,
    mut out: W,
) -> io::Result<Option<PathBuf>> {
    for (i, file) in files.iter().enumerate() {
        let display = file.strip_prefix(root).unwrap_or(file);
        writeln!(out, "  [{}] {}", i + 1, display.display())?;
    }
    loop {
        write!(out, "select a file (1-{}, blank or q to cancel): ", files.len())?;
        out.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        let line = line.trim();
        if line.is_empty() || line.eq_ignore_ascii_case("q") {
            return Ok(None);
        }
        match line.parse::<usize>() {
            Ok(n) if (1..=files.len()).contains(&n) => return Ok(Some(files[n - 1].clone())),
            _ => writeln!(out, "invalid selection: {line}")?,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn files() -> Vec<PathBuf> {
        vec![
            PathBuf::from("/tmp/x/a.xml"),
            PathBuf::from("/tmp/x/nested/b.xml"),
        ]
    }

    fn run(input: &str) -> (Option<PathBuf>, String) {
        let mut out = Vec::new();
        let chosen =
            choose_from(&files(), Path::new("/tmp/x"), Cursor::new(input), &mut out).unwrap();
        (chosen, String::from_utf8(out).unwrap())
    }

    #[test]
    fn picks_the_indexed_entry() {
        let (chosen, shown) = run("2\n");
        assert_eq!(chosen, Some(PathBuf::from("/tmp/x/nested/b.xml")));
        assert!(shown.contains("[1] a.xml"));
        assert!(shown.contains("[2] nested/b.xml"));
    }

    #[test]
    fn reprompts_on_garbage_then_accepts() {
        let (chosen, shown) = run("zero\n99\n1\n");
        assert_eq!(chosen, Some(PathBuf::from("/tmp/x/a.xml")));
        assert!(shown.contains("invalid selection: zero"));
        assert!(shown.contains("invalid selection: 99"));
    }

    #[test]
    fn blank_line_cancels() {
        assert_eq!(run("\n").0, None);
    }

    #[test]
    fn q_cancels() {
        assert_eq!(run("q\n").0, None);
    }

    #[test]
    fn end_of_input_cancels() {
        assert_eq!(run("").0, None);
    }
}
