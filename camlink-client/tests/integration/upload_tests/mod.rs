mod test_upload_cancel;
mod test_upload_retry;
mod test_upload_to_relay;
