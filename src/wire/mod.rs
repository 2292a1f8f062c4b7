pub mod codec;
pub mod primitives;
pub mod version;

pub use codec::{
    decode, decode_from_slice, decode_logical_id, decode_with_limit, encode, encode_logical_id,
    encode_to_vec, LOGICAL_ID_LEN,
};
pub use version::Version;
