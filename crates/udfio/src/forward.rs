//! Wrapping of a UDF's invocation routine with input and output validation.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::array::IoValue;
use crate::descriptor::{ArgumentDescriptor, IoArgument};
use crate::errors::{Direction, Result, UdfIoError};

type ForwardFn<U> = dyn Fn(&U, Vec<IoValue>) -> Result<IoValue> + Send + Sync;

/// How to treat a call whose argument count doesn't match the declared
/// inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArityPolicy {
    /// Error on any mismatch.
    #[default]
    Strict,
    /// Validate the arguments that have a descriptor, pass the rest through.
    Permissive,
}

/// Checking policy for a forward wrapper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForwardConfig {
    pub check_input: bool,
    pub check_output: bool,
    pub arity: ArityPolicy,
}

impl Default for ForwardConfig {
    fn default() -> Self {
        ForwardConfig {
            check_input: true,
            check_output: true,
            arity: ArityPolicy::Strict,
        }
    }
}

/// Declared inputs and outputs of a forward routine.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ForwardTags {
    pub input: Vec<ArgumentDescriptor>,
    pub output: Vec<ArgumentDescriptor>,
}

/// A forward routine along with its declared inputs and outputs.
///
/// Calling the wrapper coerces every argument to its positional input
/// descriptor, invokes the routine, then coerces the return value to the
/// output descriptors. The receiver is handed to the routine untouched.
pub struct ForwardWrapper<U> {
    func: Box<ForwardFn<U>>,
    tags: ForwardTags,
    config: ForwardConfig,
}

impl<U> ForwardWrapper<U> {
    pub fn new<F>(func: F) -> Self
    where
        F: Fn(&U, Vec<IoValue>) -> Result<IoValue> + Send + Sync + 'static,
    {
        ForwardWrapper {
            func: Box::new(func),
            tags: ForwardTags::default(),
            config: ForwardConfig::default(),
        }
    }

    pub fn with_inputs<A: Into<ArgumentDescriptor>>(
        mut self,
        inputs: impl IntoIterator<Item = A>,
    ) -> Self {
        self.tags.input = inputs.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_outputs<A: Into<ArgumentDescriptor>>(
        mut self,
        outputs: impl IntoIterator<Item = A>,
    ) -> Self {
        self.tags.output = outputs.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_config(mut self, config: ForwardConfig) -> Self {
        self.config = config;
        self
    }

    pub fn check_input(mut self, check: bool) -> Self {
        self.config.check_input = check;
        self
    }

    pub fn check_output(mut self, check: bool) -> Self {
        self.config.check_output = check;
        self
    }

    pub fn arity(mut self, arity: ArityPolicy) -> Self {
        self.config.arity = arity;
        self
    }

    pub fn tags(&self) -> &ForwardTags {
        &self.tags
    }

    pub fn config(&self) -> &ForwardConfig {
        &self.config
    }

    pub fn call(&self, udf: &U, args: Vec<IoValue>) -> Result<IoValue> {
        let args = if self.config.check_input && !self.tags.input.is_empty() {
            self.validate_inputs(args)?
        } else {
            args
        };

        let out = (self.func)(udf, args)?;

        if self.config.check_output {
            self.validate_output(out)
        } else {
            Ok(out)
        }
    }

    fn validate_inputs(&self, args: Vec<IoValue>) -> Result<Vec<IoValue>> {
        let expected = self.tags.input.len();
        if args.len() != expected && self.config.arity == ArityPolicy::Strict {
            return Err(UdfIoError::ArityMismatch {
                direction: Direction::Input,
                expected,
                actual: args.len(),
            });
        }
        trace!(args = args.len(), descriptors = expected, "validating forward inputs");

        args.into_iter()
            .enumerate()
            .map(|(idx, arg)| match self.tags.input.get(idx) {
                Some(desc) => desc
                    .validate_object(arg, true)
                    .map_err(|e| invalid(Direction::Input, idx, e)),
                None => Ok(arg),
            })
            .collect()
    }

    fn validate_output(&self, out: IoValue) -> Result<IoValue> {
        match self.tags.output.as_slice() {
            [] => Ok(out),
            [desc] => desc
                .validate_object(out, false)
                .map_err(|e| invalid(Direction::Output, 0, e)),
            descs => {
                let vals = out
                    .try_into_tuple()
                    .map_err(|e| invalid(Direction::Output, 0, e))?;
                if vals.len() != descs.len() {
                    return Err(UdfIoError::ArityMismatch {
                        direction: Direction::Output,
                        expected: descs.len(),
                        actual: vals.len(),
                    });
                }
                trace!(outputs = vals.len(), "validating forward outputs");

                vals.into_iter()
                    .zip(descs)
                    .enumerate()
                    .map(|(idx, (val, desc))| {
                        desc.validate_object(val, false)
                            .map_err(|e| invalid(Direction::Output, idx, e))
                    })
                    .collect::<Result<Vec<_>>>()
                    .map(IoValue::Tuple)
            }
        }
    }
}

fn invalid(direction: Direction, index: usize, source: UdfIoError) -> UdfIoError {
    UdfIoError::InvalidArgument {
        direction,
        index,
        source: Box::new(source),
    }
}

impl<U> fmt::Debug for ForwardWrapper<U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ForwardWrapper")
            .field("tags", &self.tags)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
