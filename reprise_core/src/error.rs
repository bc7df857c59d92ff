// Copyright 2026 the Reprise Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Recording errors.
//!
//! Both kinds of error are fatal to the recording they occur in: the
//! [`Recorder`](crate::recorder::Recorder) latches the first one, ignores every
//! call after it, and reports it from
//! [`finish`](crate::recorder::Recorder::finish). Cancelling a replay is not
//! an error; see [`RunOutcome`](crate::player::RunOutcome).

use crate::node::Command;

/// Which kind of scope a push opened.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ScopeKind {
    /// A clip, or a soft mask that has been applied as a clip.
    Clip,
    /// A soft mask whose content is still being defined.
    MaskDefinition,
    /// A transparency group.
    Group,
    /// A tiling pattern cell.
    Tile,
}

/// A push/pop sequence that cannot form a well-nested list.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum StructuralViolation {
    /// A pop arrived with nothing open.
    #[error("{command:?} with no open scope")]
    PopWithoutPush {
        /// The closing command.
        command: Command,
    },
    /// A pop arrived while a different kind of scope was innermost.
    #[error("{command:?} cannot close an open {open:?} scope")]
    Mismatch {
        /// The closing command.
        command: Command,
        /// The innermost open scope.
        open: ScopeKind,
    },
    /// A push would exceed the configured nesting limit.
    #[error("nesting deeper than the limit of {limit}")]
    DepthExceeded {
        /// The configured limit.
        limit: usize,
    },
    /// Recording finished with scopes still open.
    #[error("{open} scope(s) still open when recording finished")]
    Unbalanced {
        /// Number of scopes left open.
        open: usize,
    },
}

/// An error that aborts a recording.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ListError {
    /// The node store could not grow.
    #[error("could not grow the node store to {requested} slots")]
    AllocationFailure {
        /// Slot capacity that was requested.
        requested: usize,
    },
    /// The call sequence was not well nested.
    #[error(transparent)]
    Structural(#[from] StructuralViolation),
}
