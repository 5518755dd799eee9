// Audio repair: padding/silence trimming, loudness normalization,
// resampling and metadata rewrite.

pub mod processor;
pub mod wav;

pub use processor::{AudioProcessor, AudioProcessorConfig};
pub use wav::{read_wav, write_wav, write_wav_with_info, WavData, WavInfo};
