use std::marker::PhantomData;

use anyhow::Result;

use crate::error::Error;
use crate::render::backend::RenderBackend;
use crate::render::buffer::{BufferCategory, GpuBuffer, GpuBufferDescriptor};

/// Append-only allocator over one fixed-capacity GPU buffer.
///
/// Offsets are counted in elements of `T`. Every append returns the cursor value
/// from before the append, and the cursor never moves backwards.
pub struct BufferArena<B: RenderBackend, T: bytemuck::Pod> {
    backend: std::rc::Rc<B>,
    buffer: GpuBuffer<B>,
    category: BufferCategory,
    capacity: u32,
    cursor: u32,
    _element: PhantomData<T>,
}

impl<B: RenderBackend, T: bytemuck::Pod> BufferArena<B, T> {
    pub fn new(backend: std::rc::Rc<B>, category: BufferCategory, capacity: u32) -> Self {
        let buffer = GpuBuffer::from_backend(
            &*backend,
            GpuBufferDescriptor::for_category(
                category,
                capacity as u64,
                std::mem::size_of::<T>() as u64,
            ),
        );

        Self {
            backend,
            buffer,
            category,
            capacity,
            cursor: 0,
            _element: PhantomData,
        }
    }

    pub fn append(&mut self, data: &[T]) -> Result<u32> {
        let offset = self.cursor;

        if data.is_empty() {
            return Ok(offset);
        }

        self.ensure_fits(data.len())?;

        self.backend.write_buffer(
            &self.buffer.gpu_buffer,
            Self::byte_offset(offset),
            bytemuck::cast_slice(data),
        );
        self.cursor += data.len() as u32;

        Ok(offset)
    }

    /// Fails with the same error `append` would give for `len` more elements,
    /// without writing anything.
    pub fn ensure_fits(&self, len: usize) -> Result<()> {
        let requested = self.cursor as u64 + len as u64;

        if requested > self.capacity as u64 {
            log::error!(
                "The {} arena is full: {} + {} > {}",
                self.category,
                self.cursor,
                len,
                self.capacity
            );
            return Err(Error::ArenaCapacityExceeded {
                category: self.category,
                requested,
                capacity: self.capacity as u64,
            }
            .into());
        }

        Ok(())
    }

    pub fn cursor(&self) -> u32 {
        self.cursor
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn category(&self) -> BufferCategory {
        self.category
    }

    pub fn buffer(&self) -> &GpuBuffer<B> {
        &self.buffer
    }

    pub fn byte_offset(offset: u32) -> u64 {
        offset as u64 * std::mem::size_of::<T>() as u64
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::render::backend::testing::RecordingBackend;

    fn index_arena(capacity: u32) -> (Rc<RecordingBackend>, BufferArena<RecordingBackend, u32>) {
        let backend = Rc::new(RecordingBackend::default());
        let arena = BufferArena::new(backend.clone(), BufferCategory::Index, capacity);
        (backend, arena)
    }

    #[test]
    fn offsets_are_the_sum_of_previous_append_lengths() {
        let (_, mut arena) = index_arena(64);
        let blocks: [&[u32]; 4] = [&[1, 2, 3], &[4], &[], &[5, 6, 7, 8, 9]];

        let mut expected = 0;
        for block in blocks {
            assert_eq!(arena.append(block).unwrap(), expected);
            expected += block.len() as u32;
            assert_eq!(arena.cursor(), expected);
        }
    }

    #[test]
    fn appended_blocks_land_at_their_offsets_without_overlap() {
        let (backend, mut arena) = index_arena(8);

        let first = arena.append(&[10, 11]).unwrap();
        let second = arena.append(&[20, 21, 22]).unwrap();

        let writes = backend.writes_to("INDEX_BUFFER");
        assert_eq!(writes.len(), 2);
        assert_eq!(writes[0].byte_offset, 0);
        assert_eq!(writes[0].length, 8);
        assert_eq!(writes[1].byte_offset, 8);

        let stored = arena.buffer().gpu_buffer.records::<u32>();
        assert_eq!(&stored[first as usize..first as usize + 2], &[10, 11]);
        assert_eq!(&stored[second as usize..second as usize + 3], &[20, 21, 22]);
    }

    #[test]
    fn exceeding_capacity_is_an_error_and_leaves_the_cursor_alone() {
        let (backend, mut arena) = index_arena(4);
        arena.append(&[1, 2, 3]).unwrap();

        let error = arena.append(&[4, 5]).unwrap_err();

        assert!(matches!(
            error.downcast_ref::<Error>(),
            Some(Error::ArenaCapacityExceeded {
                category: BufferCategory::Index,
                requested: 5,
                capacity: 4,
            })
        ));
        assert_eq!(arena.cursor(), 3);
        assert_eq!(backend.writes_to("INDEX_BUFFER").len(), 1);
    }

    #[test]
    fn filling_to_exact_capacity_succeeds() {
        let (_, mut arena) = index_arena(4);

        assert_eq!(arena.append(&[1, 2, 3, 4]).unwrap(), 0);
        assert_eq!(arena.cursor(), arena.capacity());
        assert_eq!(arena.append(&[]).unwrap(), 4);
    }

    #[test]
    fn fit_check_reports_overflow_without_writing() {
        let (backend, mut arena) = index_arena(4);
        arena.append(&[1, 2]).unwrap();

        arena.ensure_fits(2).unwrap();
        assert!(arena.ensure_fits(3).is_err());
        assert_eq!(arena.cursor(), 2);
        assert_eq!(backend.writes_to("INDEX_BUFFER").len(), 1);
    }
}
