use std::io::Write;

use crate::calibration::aligner::ReflectanceStack;
use crate::calibration::common::error::Result;
use crate::calibration::output::types::StackEncoding;

pub trait StackWriter {
    fn write_stack(&self, stack: &ReflectanceStack, output: &mut dyn Write, encoding: &StackEncoding) -> Result<()>;
}
