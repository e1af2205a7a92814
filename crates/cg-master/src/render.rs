//! Offline block rendering of a whole performance.

use cg_ir::{Performance, TimedEvent};
use tracing::debug;

use crate::rack::Rack;

/// Run `input` through `rack` block by block and collect the output.
///
/// Input events are re-based to block-relative frames, outputs back to
/// absolute ones. Rendering continues `tail_frames` past the last input
/// event, then every instance releases what it still holds, so the result
/// never ends with a note sounding.
pub fn render(rack: &mut Rack, input: &mut Performance, block_size: u32, tail_frames: u64) -> Performance {
    let block_size = block_size.max(1);
    let end = input.end_frame() + tail_frames;
    let mut output = Performance::new(input.sample_rate);
    let mut block = Vec::with_capacity(block_size as usize);

    input.reset_cursor();
    let mut block_start = 0u64;
    while block_start < end {
        let block_end = block_start + block_size as u64;
        block.clear();
        for index in input.drain_before(block_end) {
            if let Some(event) = input.get(index) {
                block.push(TimedEvent::new((event.frame - block_start) as u32, event.message));
            }
        }
        rack.process_block(&block, &mut |event| {
            output.push(block_start + event.frame as u64, event.message)
        });
        rack.log_reports();
        block_start = block_end;
    }

    rack.flush(0, &mut |event| output.push(block_start + event.frame as u64, event.message));
    rack.log_reports();
    debug!(
        input = input.len(),
        output = output.len(),
        blocks = block_start / block_size as u64,
        "render finished"
    );
    output
}
