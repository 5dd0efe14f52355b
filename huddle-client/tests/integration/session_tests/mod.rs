mod test_session_events;
