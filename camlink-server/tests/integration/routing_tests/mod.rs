mod test_command_forwarding;
