use std::{ffi::c_void, fmt};

/// Address of a replacement implementation.
///
/// The calling convention belongs to the call site that will invoke it, so the registry treats
/// the value as a plain machine word: it is never dereferenced, validated or given a type.
/// The code behind it is owned by whoever registered it, and must stay loaded until the entry is
/// removed again.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct StubPointer(usize);

impl StubPointer {
    /// The null address.
    pub const NULL: StubPointer = StubPointer(0);

    /// Creates a pointer from a raw address value
    #[must_use]
    pub const fn new(addr: usize) -> Self {
        StubPointer(addr)
    }

    /// Creates a pointer from a raw function or data pointer
    #[must_use]
    pub fn from_raw(ptr: *const c_void) -> Self {
        StubPointer(ptr as usize)
    }

    /// Returns the address as an integer
    #[must_use]
    pub const fn addr(&self) -> usize {
        self.0
    }

    /// Returns the address as a raw pointer, for handing back across the boundary
    #[must_use]
    pub fn as_ptr(&self) -> *mut c_void {
        self.0 as *mut c_void
    }

    /// Returns true if this is the null address
    #[must_use]
    pub const fn is_null(&self) -> bool {
        self.0 == 0
    }
}

impl From<usize> for StubPointer {
    fn from(addr: usize) -> Self {
        StubPointer(addr)
    }
}

impl From<StubPointer> for usize {
    fn from(pointer: StubPointer) -> Self {
        pointer.0
    }
}

impl fmt::Debug for StubPointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StubPointer({self})")
    }
}

impl fmt::Display for StubPointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:0width$x}", self.0, width = std::mem::size_of::<usize>() * 2)
    }
}
