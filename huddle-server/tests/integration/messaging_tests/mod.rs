mod test_signal_forwarding;
