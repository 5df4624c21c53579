mod test_channel_delivery;
mod test_server_restart;
