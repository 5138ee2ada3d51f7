// Copyright lowRISC contributors.
// Licensed under the Apache License, Version 2.0, see LICENSE for details.
// SPDX-License-Identifier: Apache-2.0

//! Options for an execution [`Context`].

use crate::transport::Timeout;

#[cfg(doc)]
use crate::esys::Context;

/// The largest command or response buffer a [`Context`] can handle.
pub const MAX_COMMAND_SIZE: usize = 4096;

/// Options struct for initialising a [`Context`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Options {
    /// The number of times a command is submitted before a transient
    /// response code (`TPM_RC_RETRY`, `TPM_RC_TESTING`, `TPM_RC_YIELDED`)
    /// is reported to the caller. Counts the first submission.
    pub max_submissions: u32,

    /// The receive timeout used by `_finish` functions.
    ///
    /// Blocking functions always wait forever, regardless of this setting.
    pub timeout: Timeout,

    /// The largest command this context will transmit, in bytes. Capped at
    /// [`MAX_COMMAND_SIZE`].
    pub max_command_size: usize,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            max_submissions: 5,
            timeout: Timeout::Forever,
            max_command_size: MAX_COMMAND_SIZE,
        }
    }
}
