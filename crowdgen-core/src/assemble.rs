//! Constructor argument assembler: linearizes module parameters.
//!
//! A single left fold over the sale modules produces the flat argument list
//! the outer constructor accepts and, for each module, the contiguous slice it
//! forwards to its base constructor. The running index is the accumulated
//! length; nothing outside the fold is mutated.

use std::ops::Range;

use serde::Serialize;

use crate::convert::{parse_literal, ConvertError, Literal, ParamType};
use crate::module::{ModuleDescriptor, ModuleId, ParamSpec};

/// A constructor parameter with its position in the global argument list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexedParam {
    pub index: usize,
    pub param: ParamSpec,
}

/// The half-open range `[start, start + len)` owned by one module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ArgSlice {
    pub module: ModuleId,
    pub start: usize,
    pub len: usize,
}

impl ArgSlice {
    pub fn end(&self) -> usize {
        self.start + self.len
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.end()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ArgumentLayout {
    pub constructor_args: Vec<IndexedParam>,
    /// In module order.
    pub module_arg_slices: Vec<ArgSlice>,
}

/// Flatten module parameters in module order, recording each module's slice.
///
/// Zero-parameter modules still get a (zero-length) slice.
pub fn assemble_arguments(modules: &[ModuleDescriptor]) -> ArgumentLayout {
    let (constructor_args, module_arg_slices) = modules.iter().fold(
        (Vec::new(), Vec::new()),
        |(mut args, mut slices): (Vec<IndexedParam>, Vec<ArgSlice>), module| {
            let start = args.len();
            args.extend(
                module
                    .constructor_params
                    .iter()
                    .cloned()
                    .enumerate()
                    .map(|(offset, param)| IndexedParam {
                        index: start + offset,
                        param,
                    }),
            );
            slices.push(ArgSlice {
                module: module.id,
                start,
                len: module.param_count(),
            });
            (args, slices)
        },
    );

    ArgumentLayout {
        constructor_args,
        module_arg_slices,
    }
}

impl ArgumentLayout {
    pub fn len(&self) -> usize {
        self.constructor_args.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constructor_args.is_empty()
    }

    pub fn slice_of(&self, module: ModuleId) -> Option<&ArgSlice> {
        self.module_arg_slices.iter().find(|s| s.module == module)
    }

    /// Parameters a module forwards to its base constructor.
    pub fn params_for(&self, slice: &ArgSlice) -> &[IndexedParam] {
        &self.constructor_args[slice.range()]
    }

    /// `index → type` table for the deployment-script runtime parser.
    pub fn type_table(&self) -> Vec<(usize, ParamType)> {
        self.constructor_args
            .iter()
            .map(|a| (a.index, a.param.ty))
            .collect()
    }

    /// Check that slices tile `[0, len)` in order with no gaps or overlaps and
    /// that every argument's index matches its position.
    pub fn check_partition(&self) -> Result<(), String> {
        let mut cursor = 0;
        for slice in &self.module_arg_slices {
            if slice.start != cursor {
                return Err(format!(
                    "slice for {} starts at {} but previous slice ended at {}",
                    slice.module, slice.start, cursor
                ));
            }
            cursor = slice.end();
        }
        if cursor != self.len() {
            return Err(format!(
                "slices cover {} arguments but {} were assembled",
                cursor,
                self.len()
            ));
        }
        match self
            .constructor_args
            .iter()
            .enumerate()
            .find(|(pos, arg)| arg.index != *pos)
        {
            Some((pos, arg)) => Err(format!("argument at {} carries index {}", pos, arg.index)),
            None => Ok(()),
        }
    }

    /// Parse externally supplied deployment arguments by the type table.
    pub fn parse_deploy_args<S: AsRef<str>>(&self, raw: &[S]) -> Result<Vec<Literal>, ConvertError> {
        if raw.len() != self.len() {
            return Err(ConvertError::ArgumentCount {
                expected: self.len(),
                actual: raw.len(),
            });
        }
        self.constructor_args
            .iter()
            .zip(raw)
            .map(|(arg, value)| {
                parse_literal(arg.param.ty, value.as_ref()).map_err(|e| ConvertError::Argument {
                    index: arg.index,
                    source: Box::new(e),
                })
            })
            .collect()
    }
}
