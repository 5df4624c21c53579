mod test_relay_session;
