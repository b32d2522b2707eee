/// Capacity below which the buffer doubles on growth.
const DOUBLING_LIMIT: usize = 4096;

/// Fixed increment used once the buffer has passed [`DOUBLING_LIMIT`].
const LINEAR_INCREMENT: usize = 1024;

const INITIAL_CAPACITY: usize = 16;

/// Accumulator for the bodies of hex, base64 and quoted-string atoms.
///
/// Capacity doubles while small and then grows in fixed steps, so long
/// bodies are neither reallocated per byte nor over-allocated by half.
#[derive(Debug)]
pub(crate) struct GrowableBuffer {
    bytes: Vec<u8>,
}

impl GrowableBuffer {
    pub fn new() -> Self {
        Self::with_capacity(INITIAL_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            bytes: Vec::with_capacity(capacity.max(1)),
        }
    }

    #[inline]
    pub fn push(&mut self, byte: u8) {
        if self.bytes.len() == self.bytes.capacity() {
            self.grow();
        }
        self.bytes.push(byte);
    }

    fn grow(&mut self) {
        let capacity = self.bytes.capacity().max(1);
        let additional = if capacity > DOUBLING_LIMIT {
            LINEAR_INCREMENT
        } else {
            capacity
        };
        self.bytes.reserve_exact(capacity + additional - self.bytes.len());
    }

    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    #[cfg(test)]
    fn capacity(&self) -> usize {
        self.bytes.capacity()
    }
}
