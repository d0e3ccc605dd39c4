//! Pre-mutation size gate.
//!
//! Computes the prospective line count of the target file from the proposed
//! change alone (the edit is never materialized just to measure it) and
//! blocks mutations that would leave a mapped file over its limit.

use ahg_common::util::count_lines;
use ahg_common::{Change, Mutation, Verdict, Violation, ViolationKind};
use tracing::debug;

use crate::context::Context;

/// Evaluate a proposed mutation against the size policy.
pub fn evaluate(ctx: &Context, mutation: &Mutation) -> Verdict {
    let Some(entry) = ctx.policy.lookup_path(&mutation.path) else {
        debug!("{}: unmapped extension, size gate passes", mutation.path.display());
        return Verdict::pass();
    };
    let limit = entry.line_limit;

    let resolved = ctx.resolve(&mutation.path);
    let current_content = std::fs::read_to_string(&resolved).ok();
    let current = current_content.as_deref().map(count_lines).unwrap_or(0);

    let prospective = match &mutation.change {
        Change::Rewrite(content) => count_lines(content),
        Change::Splice { old, new } => {
            let occurs = current_content
                .as_deref()
                .is_some_and(|content| content.contains(old.as_str()));
            if occurs {
                current.saturating_sub(count_lines(old)) + count_lines(new)
            } else {
                // The replaced span is not literally present, so the spliced
                // count is unreliable; fail closed by assuming the edit only
                // inserts.
                current + count_lines(new)
            }
        }
    };

    // Shrink exemption: a file already over its limit may always be reduced,
    // even if a single edit cannot bring it all the way under.
    if current > limit && prospective < current {
        debug!(
            "{}: shrink exemption ({} -> {} lines, limit {})",
            mutation.path.display(),
            current,
            prospective,
            limit
        );
        return Verdict::pass();
    }

    if prospective > limit {
        return Verdict::block(Violation::new(
            ViolationKind::SizeExceeded,
            mutation.path.clone(),
            format!("would reach {prospective} lines (limit {limit}, currently {current})"),
        ));
    }

    Verdict::pass()
}
