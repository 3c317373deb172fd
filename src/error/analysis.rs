//! Audio decoding, model and analysis errors

use super::error_constructors;

error_constructors! {
    decode_failed => AudioDecodeFailed { path, reason };
    resample_failed => ResampleFailed { reason };
    model_load_failed => ModelLoadFailed { path, reason };
    inference_failed => InferenceFailed { reason };
}
