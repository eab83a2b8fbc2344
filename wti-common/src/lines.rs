use std::{borrow::Cow, io::BufRead};

/// Call `f` with each line of `reader`, without its line terminator
///
/// Bytes which are not valid UTF-8 are replaced rather than failing the read, since config files
/// and node lists may carry Latin-1 text in comments or hostnames.
pub(crate) fn for_each_line<R: BufRead>(
    mut reader: R,
    mut f: impl FnMut(&str),
) -> std::io::Result<()> {
    let mut buf = Vec::new();
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            return Ok(());
        }
        let line = String::from_utf8_lossy(&buf);
        if let Cow::Owned(_) = line {
            log::debug!("Replaced invalid UTF-8 in line {line:?}");
        }
        f(line.trim_end_matches(['\n', '\r']));
    }
}
