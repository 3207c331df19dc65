//! Names and slots the generated code relies on.

/// Allocates a block of memory, given its size in words.
pub const MEMORY_ALLOC: &str = "Memory.alloc";

/// Creates a string object, given its maximum length.
pub const STRING_NEW: &str = "String.new";

/// Appends a character code to a string, returning the string.
pub const STRING_APPEND_CHAR: &str = "String.appendChar";

/// Multiplication is a library routine, not a VM primitive.
pub const MATH_MULTIPLY: &str = "Math.multiply";

/// Division is a library routine, not a VM primitive.
pub const MATH_DIVIDE: &str = "Math.divide";

/// Implicit first argument of a method.
pub const RECEIVER: &str = "this";

/// `temp` slot that receives discarded call results, and parks
/// the assigned value of an array element.
pub const SCRATCH_TEMP: u16 = 0;

/// `pointer` slot that bases the `this` segment.
pub const POINTER_THIS: u16 = 0;

/// `pointer` slot that bases the `that` segment.
pub const POINTER_THAT: u16 = 1;

/// Largest value a `push constant` can carry.
pub const MAX_CONSTANT: u32 = 32767;
