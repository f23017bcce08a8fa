mod clock_quality;
