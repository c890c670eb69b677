//! Text blob → container tree, best effort.

use tracing::{debug, trace, warn};

use super::line::{BOUNDED, Call, DataLine, NUMBER, REACTIVE, TEXT};
use super::path::SectionPath;
use super::{LoadIssue, LoadReport};
use crate::container::{AttributeContainer, HolderKind, NumericHolder};
use crate::error::{HookError, LoadError};
use crate::event::isolate;
use crate::numeric::NumericTag;

/// Loads `blob` into `root`.
///
/// Never aborts: malformed lines and unknown keys skip one line, an
/// unresolvable section header skips every line up to the next header. Data
/// lines before the first header apply to the root. Load hooks run isolated
/// and their failures are only logged.
pub fn load(root: &AttributeContainer, blob: &str) -> LoadReport {
    let mut report = LoadReport::default();
    if blob.trim().is_empty() {
        warn!(kind = root.kind(), "refusing to load an empty blob");
        return report;
    }

    run_hook("before_load", root, || root.schema().before_load(root));

    let mut current = Some(root);
    for (index, raw) in lines(blob).enumerate() {
        let line_no = index + 1;
        let line = raw.trim_start();
        let trimmed = line.trim_end();
        if trimmed.is_empty() {
            continue;
        }

        if let Some(path) = header(trimmed) {
            current = match SectionPath::parse(path).and_then(|p| p.resolve(root)) {
                Ok(container) => {
                    trace!(line = line_no, path, "entering section");
                    Some(container)
                }
                Err(source) => {
                    warn!(line = line_no, path, %source, "skipping unresolvable section");
                    report.sections_skipped += 1;
                    report.issues.push(LoadIssue {
                        line_no,
                        error: LoadError::SectionResolution {
                            path: path.to_owned(),
                            source,
                        },
                    });
                    None
                }
            };
            continue;
        }

        let Some(container) = current else {
            trace!(line = line_no, "line in skipped section");
            report.lines_skipped += 1;
            continue;
        };

        match apply_line(container, line) {
            Ok(()) => report.lines_applied += 1,
            Err(error) => {
                warn!(line = line_no, kind = container.kind(), %error, "skipping line");
                report.lines_skipped += 1;
                report.issues.push(LoadIssue { line_no, error });
            }
        }
        run_hook("after_load_line", container, || {
            container.schema().after_load_line(container, trimmed)
        });
    }

    run_hook("after_load", root, || root.schema().after_load(root));
    report.success = true;
    debug!(
        kind = root.kind(),
        applied = report.lines_applied,
        skipped = report.lines_skipped,
        sections_skipped = report.sections_skipped,
        "loaded attribute blob"
    );
    report
}

/// Loads `blob` into `root`, returning only the overall success flag
/// (false only for empty input).
pub fn load_from(root: &AttributeContainer, blob: &str) -> bool {
    load(root, blob).success
}

/// Lines separated by `\n`, `\r\n` or `\r`.
fn lines(blob: &str) -> impl Iterator<Item = &str> {
    blob.split('\n')
        .flat_map(|l| l.strip_suffix('\r').unwrap_or(l).split('\r'))
}

fn header(line: &str) -> Option<&str> {
    line.strip_prefix('[')?.strip_suffix(']')
}

fn run_hook(
    stage: &'static str,
    container: &AttributeContainer,
    hook: impl FnOnce() -> Result<(), HookError>,
) {
    match isolate(hook) {
        Ok(Ok(())) => {}
        Ok(Err(err)) => debug!(stage, kind = container.kind(), %err, "load hook failed"),
        Err(message) => debug!(stage, kind = container.kind(), %message, "load hook panicked"),
    }
}

fn unknown(container: &AttributeContainer, name: &str, expected: HolderKind) -> LoadError {
    LoadError::UnknownKey {
        container: container.kind().to_owned(),
        name: name.to_owned(),
        expected: expected.into(),
    }
}

fn apply_line(container: &AttributeContainer, line: &str) -> Result<(), LoadError> {
    let data = DataLine::split(line)?;
    match data.sigil {
        TEXT => {
            let target = container
                .try_text(data.name)
                .ok_or_else(|| unknown(container, data.name, HolderKind::Text))?;
            target.set(data.payload);
            Ok(())
        }
        BOUNDED => {
            let call = Call::parse(line, data.payload)?;
            expect_trailer(line, &call, &[""])?;
            match call.tag {
                NumericTag::Int => apply_bounded::<i32>(container, &data, &call, line),
                NumericTag::Float => apply_bounded::<f32>(container, &data, &call, line),
                NumericTag::Double => apply_bounded::<f64>(container, &data, &call, line),
            }
        }
        REACTIVE => {
            let call = Call::parse(line, data.payload)?;
            expect_trailer(line, &call, &["", ":"])?;
            match call.tag {
                NumericTag::Int => apply_reactive::<i32>(container, &data, &call, line),
                NumericTag::Float => apply_reactive::<f32>(container, &data, &call, line),
                NumericTag::Double => apply_reactive::<f64>(container, &data, &call, line),
            }
        }
        NUMBER => {
            let call = Call::parse(line, data.payload)?;
            expect_trailer(line, &call, &[""])?;
            match call.tag {
                NumericTag::Int => apply_number::<i32>(container, &data, &call, line),
                NumericTag::Float => apply_number::<f32>(container, &data, &call, line),
                NumericTag::Double => apply_number::<f64>(container, &data, &call, line),
            }
        }
        _ => Err(LoadError::StructuralParse {
            line: line.to_owned(),
            reason: "unknown sigil",
        }),
    }
}

fn expect_trailer(line: &str, call: &Call<'_>, allowed: &[&str]) -> Result<(), LoadError> {
    if allowed.contains(&call.trailer.trim_end()) {
        Ok(())
    } else {
        Err(LoadError::StructuralParse {
            line: line.to_owned(),
            reason: "unexpected text after `)`",
        })
    }
}

fn apply_bounded<T: NumericHolder>(
    container: &AttributeContainer,
    data: &DataLine<'_>,
    call: &Call<'_>,
    line: &str,
) -> Result<(), LoadError> {
    let target = container
        .try_bounded::<T>(data.name)
        .ok_or_else(|| unknown(container, data.name, HolderKind::bounded(T::TAG)))?;
    let [current, min, max] = call.values::<T, 3>(line)?;
    target.set_range(min, max);
    target.set_current(current);
    Ok(())
}

fn apply_reactive<T: NumericHolder>(
    container: &AttributeContainer,
    data: &DataLine<'_>,
    call: &Call<'_>,
    line: &str,
) -> Result<(), LoadError> {
    let target = container
        .try_reactive::<T>(data.name)
        .ok_or_else(|| unknown(container, data.name, HolderKind::reactive(T::TAG)))?;
    let [base] = call.values::<T, 1>(line)?;
    target.set_base(base);
    Ok(())
}

fn apply_number<T: NumericHolder>(
    container: &AttributeContainer,
    data: &DataLine<'_>,
    call: &Call<'_>,
    line: &str,
) -> Result<(), LoadError> {
    let target = container
        .try_number::<T>(data.name)
        .ok_or_else(|| unknown(container, data.name, HolderKind::number(T::TAG)))?;
    let [value] = call.values::<T, 1>(line)?;
    target.set(value);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_every_line_ending() {
        let got: Vec<_> = lines("a\r\nb\nc\rd").collect();
        assert_eq!(got, vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn headers_need_both_brackets() {
        assert_eq!(header("[Player.bag[1]]"), Some("Player.bag[1]"));
        assert_eq!(header("[Player"), None);
        assert_eq!(header("*hp:I(1,0,1)"), None);
    }
}
