//! The segment pool: dynamically allocated word arrays addressed by id.
//!
//! Ids are dense indices into a single backing vector; a freed slot keeps its
//! index but drops its storage (`None`), and the id goes onto a LIFO free
//! list for reuse. Segment 0 is the executing program: always active, never
//! freeable, and replaced wholesale only by the Load Program operation.

use crate::error::VmError;

pub struct SegmentPool {
    /// Index = segment id. `None` marks a freed slot whose backing storage
    /// has already been released.
    segments: Vec<Option<Box<[u32]>>>,
    /// Freed ids, most recently freed last. Reused LIFO to keep the id space
    /// compact.
    free_list: Vec<u32>,
}

impl SegmentPool {
    /// Creates a pool whose segment 0 holds `program`.
    pub fn new(program: Vec<u32>) -> Self {
        Self {
            segments: vec![Some(program.into_boxed_slice())],
            free_list: Vec::new(),
        }
    }

    /// Allocates a zero-filled segment of `len` words and returns its id.
    ///
    /// The id is never 0 and never one that is currently active: either the
    /// most recently freed id or a freshly minted one. `len == 0` yields a
    /// zero-length segment that is still active.
    pub fn alloc(&mut self, len: u32) -> u32 {
        let segment = vec![0u32; len as usize].into_boxed_slice();
        match self.free_list.pop() {
            Some(id) => {
                self.segments[id as usize] = Some(segment);
                id
            }
            None => {
                let id = self.segments.len() as u32;
                self.segments.push(Some(segment));
                id
            }
        }
    }

    /// Frees an active, nonzero segment, releasing its storage immediately.
    pub fn free(&mut self, id: u32) -> Result<(), VmError> {
        if id == 0 {
            return Err(VmError::FreeProgramSegment);
        }
        match self.segments.get_mut(id as usize) {
            Some(slot) if slot.is_some() => {
                *slot = None;
                self.free_list.push(id);
                Ok(())
            }
            _ => Err(VmError::FreeInactiveSegment { id }),
        }
    }

    pub fn read(&self, id: u32, offset: u32) -> Result<u32, VmError> {
        let segment = self.segment(id)?;
        segment
            .get(offset as usize)
            .copied()
            .ok_or(VmError::OffsetOutOfBounds {
                id,
                offset,
                len: segment.len() as u32,
            })
    }

    pub fn write(&mut self, id: u32, offset: u32, value: u32) -> Result<(), VmError> {
        let segment = self.segment_mut(id)?;
        let len = segment.len() as u32;
        match segment.get_mut(offset as usize) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(VmError::OffsetOutOfBounds { id, offset, len }),
        }
    }

    /// Replaces segment 0 with an independent copy of `src_id`'s contents.
    ///
    /// The source segment is untouched and stays allocated; later writes
    /// through it must not alias the program segment, hence the copy.
    pub fn replace_program(&mut self, src_id: u32) -> Result<(), VmError> {
        let copy = Box::from(self.segment(src_id)?);
        self.segments[0] = Some(copy);
        Ok(())
    }

    /// Whether `id` currently refers to a live segment.
    pub fn active(&self, id: u32) -> bool {
        matches!(self.segments.get(id as usize), Some(Some(_)))
    }

    /// Length of segment 0, in words. Drives the fetch bounds check.
    pub fn program_len(&self) -> u32 {
        self.segments
            .first()
            .and_then(|slot| slot.as_deref())
            .map_or(0, |segment| segment.len() as u32)
    }

    /// Length of an active segment, in words.
    pub fn len(&self, id: u32) -> Result<u32, VmError> {
        Ok(self.segment(id)?.len() as u32)
    }

    /// Freed ids awaiting reuse, in free order (next reuse candidate last).
    pub fn recycled_ids(&self) -> &[u32] {
        &self.free_list
    }

    fn segment(&self, id: u32) -> Result<&[u32], VmError> {
        self.segments
            .get(id as usize)
            .and_then(|slot| slot.as_deref())
            .ok_or(VmError::InactiveSegment { id })
    }

    fn segment_mut(&mut self, id: u32) -> Result<&mut [u32], VmError> {
        self.segments
            .get_mut(id as usize)
            .and_then(|slot| slot.as_deref_mut())
            .ok_or(VmError::InactiveSegment { id })
    }
}
