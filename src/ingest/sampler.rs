use anyhow::Result;

use super::FrameSource;
use crate::frame::Frame;

/// Yields every Nth frame of a source (frames N, 2N, 3N, ...).
///
/// Skipped frames are still decoded; only inference is avoided. A skip factor
/// of 0 or 1 yields every frame. The sampler stops at the first source error
/// after handing it to the caller.
pub struct FrameSampler<'a> {
    source: &'a mut dyn FrameSource,
    skip: u64,
    done: bool,
}

impl<'a> FrameSampler<'a> {
    pub fn new(source: &'a mut dyn FrameSource, skip: u64) -> Self {
        Self {
            source,
            skip,
            done: false,
        }
    }

    fn is_sampled(&self, frame: &Frame) -> bool {
        self.skip <= 1 || frame.index % self.skip == 0
    }
}

impl Iterator for FrameSampler<'_> {
    type Item = Result<Frame>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            match self.source.next_frame() {
                Ok(Some(frame)) => {
                    if self.is_sampled(&frame) {
                        return Some(Ok(frame));
                    }
                }
                Ok(None) => self.done = true,
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::SyntheticSource;

    #[test]
    fn samples_every_nth_frame_one_based() {
        let mut source = SyntheticSource::new(4, 4, 30.0, 23);
        let indexes: Vec<u64> = FrameSampler::new(&mut source, 5)
            .map(|frame| frame.unwrap().index)
            .collect();
        assert_eq!(indexes, vec![5, 10, 15, 20]);
    }

    #[test]
    fn skip_of_one_yields_every_frame() {
        let mut source = SyntheticSource::new(4, 4, 30.0, 3);
        assert_eq!(FrameSampler::new(&mut source, 1).count(), 3);

        let mut source = SyntheticSource::new(4, 4, 30.0, 3);
        assert_eq!(FrameSampler::new(&mut source, 0).count(), 3);
    }

    #[test]
    fn sampler_is_finite_and_not_restartable() {
        let mut source = SyntheticSource::new(4, 4, 30.0, 10);
        let mut sampler = FrameSampler::new(&mut source, 5);
        assert_eq!(sampler.by_ref().count(), 2);
        assert!(sampler.next().is_none());
    }

    #[test]
    fn sampler_stops_after_source_error() {
        let mut source = SyntheticSource::new(4, 4, 30.0, 20).failing_at(7);
        let results: Vec<_> = FrameSampler::new(&mut source, 5).collect();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].as_ref().unwrap().index, 5);
        assert!(results[1].is_err());
    }
}
