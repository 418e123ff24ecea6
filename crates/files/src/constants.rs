/// Name of the directory under the store root that holds blob shards.
pub const BLOBS_FOLDER_NAME: &str = "blobs";
