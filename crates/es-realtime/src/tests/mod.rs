mod realtime_feed;
